//! Query string dictionary for request parameters.
//!
//! [`QueryDict`] holds the decoded pairs of a URL query string or an
//! `application/x-www-form-urlencoded` body. Keys may repeat; [`QueryDict::get`]
//! returns the first value and [`QueryDict::get_list`] returns all of them.

use std::collections::HashMap;

/// An immutable dictionary for query string and form data.
///
/// # Examples
///
/// ```
/// use waypoint_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("red"));
/// assert_eq!(qd.get_list("color").map(Vec::len), Some(2));
/// assert!(qd.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    data: HashMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded string (e.g. `"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space. Pairs without `=` get an
    /// empty value.
    pub fn parse(query_string: &str) -> Self {
        Self::parse_bytes(query_string.as_bytes())
    }

    /// Parses URL-encoded bytes, such as a form body.
    pub fn parse_bytes(input: &[u8]) -> Self {
        let mut data: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(input) {
            data.entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Self { data }
    }

    /// Returns the first value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns all values for the given key, or `None` if not present.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get(key)
    }

    /// Returns `true` if the key is present, even with an empty value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}
