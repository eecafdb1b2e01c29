use hyper::HeaderMap;
use std::collections::HashMap;

/// Read access to already parsed request headers.
///
/// Header names are compared case-insensitively.
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        // Any UTF-8 value, e.g. a neighbouring cookie `name=José`
        self.get(name)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
    }
}

impl HeaderLookup for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
