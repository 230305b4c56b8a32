//! Environment helpers
//!
//! Values coming from `.env` files are often quoted or carry trailing slashes;
//! these helpers normalize them before they are used as base URLs.

/// Trim whitespace and surrounding double quotes.
pub fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Normalize a base URL: cleaned and without trailing slashes.
pub fn clean_base_url(raw: &str) -> String {
    clean_value(raw).trim_end_matches('/').to_string()
}

/// Read a variable and return its cleaned value; empty values count as absent.
pub fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| clean_value(&v))
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_trailing_slashes() {
        assert_eq!(clean_base_url("  \"http://users:3001//\" "), "http://users:3001");
        assert_eq!(clean_base_url("http://costs:3002"), "http://costs:3002");
    }

    #[test]
    fn clean_value_keeps_inner_content() {
        assert_eq!(clean_value("\"a b\""), "a b");
        assert_eq!(clean_value(""), "");
    }
}
