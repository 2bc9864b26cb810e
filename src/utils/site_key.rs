/// Strip every leading and trailing `/` from a site key, so `/campaign/` and
/// `campaign` address the same scope.
pub fn normalize_site_key(raw: &str) -> String {
    raw.trim_matches('/').to_string()
}

/// Absent input stays absent: no site filter is applied.
pub fn normalize_optional_site_key(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_site_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_site_key() {
        assert_eq!(normalize_site_key("/a/b/"), "a/b");
        assert_eq!(normalize_site_key("a/b"), "a/b");
        assert_eq!(normalize_site_key("///promo//"), "promo");
        assert_eq!(normalize_site_key("/"), "");
        assert_eq!(normalize_site_key(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["/a/b/", "a/b", "//x//y//", "/", "", "plain", "a//"] {
            let once = normalize_site_key(raw);
            assert_eq!(normalize_site_key(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional_site_key(None), None);
        assert_eq!(
            normalize_optional_site_key(Some("/campaign/")),
            Some("campaign".to_string())
        );
    }
}
