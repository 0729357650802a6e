use shelf_state::{Record, sa};

/// The extensions local cover images may be stored with, in preference order.
pub const IMAGE_EXTENSIONS: [&str; 4] = [".jpeg", ".jpg", ".png", ".webp"];

const THUMB_PREFIX: &str = "thumb_";
const BACK_SUFFIX: &str = "_back";

/// Which side of the sleeve to look for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoverSide {
    #[default]
    Front,
    Back,
}

/// Turns an image hint into something loadable. Absolute URLs and paths are
/// kept as they are; anything else gets exactly one leading slash.
/// Blank hints yield `None`.
pub fn absolutize(hint: &str) -> Option<String> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    if hint.starts_with("http://") || hint.starts_with("https://") || hint.starts_with('/') {
        return Some(hint.to_string());
    }
    Some(format!("/{hint}"))
}

/// Builds the front cover candidates for `record`.
pub fn build_candidates(record: &Record, image_dir: &str) -> Vec<String> {
    build_candidates_for(record, image_dir, CoverSide::Front)
}

/// Builds the ordered list of places the artwork for `record` might be found.
///
/// Direct hints come first, then the id-keyed service route, then every local
/// file naming scheme (full images before thumbnails). The list is de-duplicated
/// and always ends with [`sa::FALLBACK_IMAGE`].
pub fn build_candidates_for(record: &Record, image_dir: &str, side: CoverSide) -> Vec<String> {
    let hints = &record.images;
    let (primary, thumb) = match side {
        CoverSide::Front => (&hints.cover_image, &hints.thumb),
        CoverSide::Back => (&hints.back_image, &hints.back_thumb),
    };
    let primary = primary.as_deref().and_then(absolutize);
    let thumb = thumb.as_deref().and_then(absolutize);

    let mut candidates = vec![];
    match primary {
        Some(primary) => candidates.push(primary),
        None if !record.id.as_str().is_empty() => candidates.push(match side {
            CoverSide::Front => sa::cover_route(record.id.as_str()),
            CoverSide::Back => sa::back_route(record.id.as_str()),
        }),
        None => {}
    }
    candidates.extend(thumb);

    let image_dir = image_dir.trim_end_matches('/');
    let identifiers = identifiers(record);
    for prefix in ["", THUMB_PREFIX] {
        for identifier in &identifiers {
            let back = format!("{identifier}{BACK_SUFFIX}");
            let stems = match side {
                CoverSide::Front => [identifier.as_str(), back.as_str()],
                CoverSide::Back => [back.as_str(), identifier.as_str()],
            };
            for stem in stems {
                for extension in IMAGE_EXTENSIONS {
                    candidates.push(format!("{image_dir}/{prefix}{stem}{extension}"));
                }
            }
        }
    }

    candidates.push(sa::FALLBACK_IMAGE.to_string());

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.clone()));
    candidates
}

/// The non-empty identifiers local files may be named after, without repeats.
fn identifiers(record: &Record) -> Vec<String> {
    let mut identifiers: Vec<String> = vec![];
    let sources = [Some(record.id.as_str()), record.images.image_id.as_deref()];
    for identifier in sources.into_iter().flatten().map(str::trim) {
        if !identifier.is_empty() && !identifiers.iter().any(|i| i == identifier) {
            identifiers.push(identifier.to_string());
        }
    }
    identifiers
}

/// Walks a record's candidates, moving on each time one fails to load.
///
/// The index only ever moves forward. Once the last candidate (the fallback)
/// is reached, further failures are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    candidates: Vec<String>,
    index: usize,
}
impl ImageResolver {
    /// Creates a resolver over `candidates`. An empty list is replaced by the fallback.
    pub fn new(candidates: Vec<String>) -> Self {
        let candidates = if candidates.is_empty() {
            vec![sa::FALLBACK_IMAGE.to_string()]
        } else {
            candidates
        };
        Self {
            candidates,
            index: 0,
        }
    }

    pub fn for_record(record: &Record, image_dir: &str, side: CoverSide) -> Self {
        Self::new(build_candidates_for(record, image_dir, side))
    }

    /// The candidate to display.
    pub fn current(&self) -> &str {
        &self.candidates[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn is_terminal(&self) -> bool {
        self.index + 1 >= self.candidates.len()
    }

    /// Records that the current candidate failed to load.
    /// Returns whether the resolver moved on to another candidate.
    pub fn on_load_failure(&mut self) -> bool {
        if self.is_terminal() {
            tracing::debug!("ignoring failure of terminal image {}", self.current());
            return false;
        }
        self.index += 1;
        tracing::debug!(
            "image candidate failed, trying {} ({}/{})",
            self.current(),
            self.index + 1,
            self.candidates.len()
        );
        true
    }
}
