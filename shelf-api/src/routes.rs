/// The collection listing endpoint.
pub const COLLECTION_ROUTE: &str = "/api/collection";
/// The persisted bin assignment endpoint.
pub const BIN_ROUTE: &str = "/api/bin";
/// The route local cover images are served from.
pub const IMAGES_ROUTE: &str = "/images";
/// The placeholder image that is always available.
pub const FALLBACK_IMAGE: &str = "/static/fallback.jpg";

/// The id-keyed front cover route. The server fetches and caches the image on first request.
///
/// Ids are percent-encoded into a single path segment by all of the id-keyed routes.
pub fn cover_route(id: &str) -> String {
    format!("/cover/{}", urlencoding::encode(id))
}

/// The id-keyed back cover route. Serves the front cover when no back image exists.
pub fn back_route(id: &str) -> String {
    format!("/back/{}", urlencoding::encode(id))
}

/// The route a single record's bin is persisted to.
pub fn bin_route(id: &str) -> String {
    format!("{BIN_ROUTE}/{}", urlencoding::encode(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(cover_route("42"), "/cover/42");
        assert_eq!(back_route("42"), "/back/42");
        assert_eq!(bin_route("1626692"), "/api/bin/1626692");
    }

    #[test]
    fn test_routes_encode_ids() {
        assert_eq!(cover_route("a/b"), "/cover/a%2Fb");
        assert_eq!(back_route("x?y"), "/back/x%3Fy");
        assert_eq!(bin_route("LP #1"), "/api/bin/LP%20%231");
    }
}
