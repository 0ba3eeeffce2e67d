//! The request abstraction consumed by the dispatcher.

use std::collections::HashMap;

use crate::params::Params;

/// An incoming request, as handed over by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Request path, without the query string.
    pub path: String,
    /// Query string parameters.
    pub query: HashMap<String, String>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Routing parameters, set once the path has been resolved.
    params: Option<Params>,
}

impl Request {
    /// Creates a request from a raw URL, splitting off the query string.
    pub fn new(url: impl AsRef<str>) -> Self {
        let url = url.as_ref();
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let path = if path.is_empty() { "/" } else { path };

        Self {
            path: path.to_string(),
            query: Self::parse_query_string(query),
            ..Self::default()
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets a header value, case-insensitively.
    #[must_use]
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Gets a query parameter.
    #[must_use]
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Returns the routing parameters, if the request has been routed.
    #[must_use]
    pub const fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    /// Stores the routing parameters.
    pub fn set_params(&mut self, params: Params) {
        self.params = Some(params);
    }

    /// Parses query parameters from a query string.
    ///
    /// Malformed input yields an empty map.
    #[must_use]
    pub fn parse_query_string(query: &str) -> HashMap<String, String> {
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_query() {
        let req = Request::new("/posts/index?page=2&sort=title");
        assert_eq!(req.path, "/posts/index");
        assert_eq!(req.get_query("page"), Some("2"));
        assert_eq!(req.get_query("sort"), Some("title"));
        assert!(req.params().is_none());
    }

    #[test]
    fn test_empty_path_is_root() {
        assert_eq!(Request::new("").path, "/");
        assert_eq!(Request::new("?x=1").path, "/");
    }

    #[test]
    fn test_header_lookup() {
        let req = Request::new("/").header("Content-Type", "application/json");
        assert_eq!(req.get_header("content-type"), Some("application/json"));
        assert_eq!(req.get_header("accept"), None);
    }

    #[test]
    fn test_query_string_parsing() {
        let query = Request::parse_query_string("name=John+Doe&age=30&city=New%20York");
        assert_eq!(query.get("name"), Some(&"John Doe".to_string()));
        assert_eq!(query.get("age"), Some(&"30".to_string()));
        assert_eq!(query.get("city"), Some(&"New York".to_string()));
    }
}
