use std::collections::HashMap;

/// Parse query parameters from a URI string.
///
/// Handles URL decoding and returns a HashMap of parameter key-value pairs.
/// Multiple values for the same key are not supported (only the last is kept).
pub fn parse_query_params(uri: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if let Some(query_start) = uri.find('?') {
        let query = &uri[query_start + 1..];
        for param in query.split('&') {
            if let Some(eq_idx) = param.find('=') {
                let key = &param[..eq_idx];
                let encoded_value = &param[eq_idx + 1..];
                let decoded = urlencoding::decode(encoded_value)
                    .unwrap_or(std::borrow::Cow::Borrowed(encoded_value))
                    .to_string();
                params.insert(key.to_string(), decoded);
            } else {
                // Flag parameter without value
                params.insert(param.to_string(), String::new());
            }
        }
    }

    params
}

/// Requested page number from `?page=N`. Non-numeric or missing values
/// fall back to 1; range clamping is the paginator's job.
pub fn page_number(uri: &str) -> usize {
    parse_query_params(uri)
        .get("page")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

/// The `next` parameter carried by the login redirect.
pub fn next_target(uri: &str) -> Option<String> {
    parse_query_params(uri).get("next").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decoded_pairs() {
        let params = parse_query_params("/auth/login/?next=%2Fcreate%2F&page=2");
        assert_eq!(params.get("next").map(String::as_str), Some("/create/"));
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn page_number_defaults_to_one() {
        assert_eq!(page_number("/"), 1);
        assert_eq!(page_number("/?page=abc"), 1);
        assert_eq!(page_number("/?page=0"), 1);
        assert_eq!(page_number("/?page=7"), 7);
    }

    #[test]
    fn next_target_absent_without_query() {
        assert_eq!(next_target("/auth/login/"), None);
    }
}
