/// Normalise free-text filter input for case-insensitive matching.
/// Returns `None` when the input is blank, meaning "no constraint".
pub fn normalize_needle(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Parse a year typed into a filter box. Anything that isn't a positive
/// integer yields `None`, meaning "no year filter".
pub fn parse_year_input(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|year| *year > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_needle() {
        assert_eq!(normalize_needle("  Love "), Some("love".to_string()));
        assert_eq!(normalize_needle("ÉTÉ"), Some("été".to_string()));
        assert_eq!(normalize_needle(""), None);
        assert_eq!(normalize_needle(" \t "), None);
    }

    #[test]
    fn test_parse_year_input() {
        assert_eq!(parse_year_input("1977"), Some(1977));
        assert_eq!(parse_year_input(" 1977\n"), Some(1977));

        // Test rejected input
        assert_eq!(parse_year_input(""), None);
        assert_eq!(parse_year_input("0"), None);
        assert_eq!(parse_year_input("-1977"), None);
        assert_eq!(parse_year_input("1977.5"), None);
        assert_eq!(parse_year_input("seventies"), None);
    }
}
