use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use url::Url;

use crate::error::Result;

/// The `utm_*` family, offered as a ready-made tracking list.
pub const COMMON_UTM_PARAMETERS: [&str; 5] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
];

/// Key/value view of a URL's query string.
///
/// Keys are unique. Re-inserting a key keeps its original position and
/// overwrites the value, so a query like `a=1&b=2&a=3` becomes `a=3, b=2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: Vec<(String, String)>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for ParameterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ParameterMapVisitor;

        impl<'de> Visitor<'de> for ParameterMapVisitor {
            type Value = ParameterMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of string parameters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut map = ParameterMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ParameterMapVisitor)
    }
}

fn parse_url(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(url, error = %e, "Invalid URL");
            None
        }
    }
}

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}

/// Returns the percent-decoded query parameters of `url`.
///
/// An unparseable URL yields an empty map instead of an error.
pub fn extract_parameters(url: &str) -> ParameterMap {
    match parse_url(url) {
        Some(parsed) => parsed.query_pairs().into_owned().collect(),
        None => ParameterMap::new(),
    }
}

/// Keeps every parameter of `params` whose name is not listed in `tracking`.
/// Names are compared exactly.
pub fn filter_parameters<S: AsRef<str>>(params: &ParameterMap, tracking: &[S]) -> ParameterMap {
    params
        .iter()
        .filter(|(key, _)| !tracking.iter().any(|t| t.as_ref() == *key))
        .collect()
}

pub fn remove_tracking_parameters<S: AsRef<str>>(url: &str, tracking: &[S]) -> ParameterMap {
    filter_parameters(&extract_parameters(url), tracking)
}

/// Rebuilds `base` with its query string replaced by `params`.
///
/// Path and fragment are preserved. An empty map drops the `?` entirely.
pub fn generate_modified_url(base: &str, params: &ParameterMap) -> Result<String> {
    let mut url = Url::parse(base)?;

    if params.is_empty() {
        url.set_query(None);
    } else {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in params.iter() {
            query.append_pair(key, value);
        }
        url.set_query(Some(&query.finish()));
    }

    Ok(url.to_string())
}

/// Filters `tracking` out of `url` and returns the rebuilt URL.
pub fn remove_tracking_params<S: AsRef<str>>(url: &str, tracking: &[S]) -> Result<String> {
    Url::parse(url)?;
    generate_modified_url(url, &remove_tracking_parameters(url, tracking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_extract_parameters() {
        let params = extract_parameters("https://example.com/path?foo=bar&baz=qux");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("foo"), Some("bar"));
        assert_eq!(params.get("baz"), Some("qux"));
    }

    #[test]
    fn test_extract_decodes_values() {
        let params = extract_parameters("https://example.com/?q=a%20b&r=c+d&s=%C3%A9");
        assert_eq!(params.get("q"), Some("a b"));
        assert_eq!(params.get("r"), Some("c d"));
        assert_eq!(params.get("s"), Some("é"));
    }

    #[test]
    fn test_extract_duplicate_keys_last_value_wins() {
        let params = extract_parameters("https://example.com/?a=1&b=2&a=3");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("3"));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_invalid_url_is_empty() {
        assert!(extract_parameters("not a url").is_empty());
        assert!(extract_parameters("").is_empty());
    }

    #[test]
    fn test_extract_no_query() {
        assert!(extract_parameters("https://example.com/page#frag").is_empty());
    }

    #[test]
    fn test_filter_removes_only_listed_keys() {
        let params: ParameterMap = vec![("utm_source", "x"), ("ref", "y"), ("utm_medium", "m")]
            .into_iter()
            .collect();
        let tracking = vec!["utm_source".to_string(), "utm_medium".to_string(), "absent".to_string()];

        let filtered = filter_parameters(&params, &tracking);

        for name in &tracking {
            assert!(!filtered.contains_key(name));
        }
        for (key, value) in params.iter() {
            if !tracking.iter().any(|t| t == key) {
                assert_eq!(filtered.get(key), Some(value));
            }
        }
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let filtered = remove_tracking_parameters("https://example.com/?UTM_SOURCE=x&utm_source=y", &["utm_source"]);
        assert_eq!(filtered.get("UTM_SOURCE"), Some("x"));
        assert!(!filtered.contains_key("utm_source"));
    }

    #[test]
    fn test_filter_has_no_wildcards() {
        let filtered = remove_tracking_parameters("https://example.com/?utm_source=x", &["utm_*"]);
        assert_eq!(filtered.get("utm_source"), Some("x"));
    }

    #[test]
    fn test_remove_tracking_parameters_invalid_url() {
        assert!(remove_tracking_parameters("::::", &["a"]).is_empty());
    }

    #[test]
    fn test_scenario_strip_utm_source() {
        let url = "https://example.com/?utm_source=x&ref=y";
        let filtered = remove_tracking_parameters(url, &["utm_source"]);
        assert_eq!(filtered, vec![("ref", "y")].into_iter().collect::<ParameterMap>());

        let rebuilt = generate_modified_url(url, &filtered).unwrap();
        assert_eq!(rebuilt, "https://example.com/?ref=y");
    }

    #[test]
    fn test_generate_keeps_path_and_fragment() {
        let mut params = ParameterMap::new();
        params.insert("page", "2");
        let rebuilt = generate_modified_url("https://example.com/a/b?old=1#section", &params).unwrap();
        assert_eq!(rebuilt, "https://example.com/a/b?page=2#section");
    }

    #[test]
    fn test_generate_empty_map_drops_query() {
        let rebuilt = generate_modified_url("https://example.com/a?x=1", &ParameterMap::new()).unwrap();
        assert_eq!(rebuilt, "https://example.com/a");
    }

    #[test]
    fn test_generate_encodes_values() {
        let mut params = ParameterMap::new();
        params.insert("q", "a b&c=d");
        let rebuilt = generate_modified_url("https://example.com/", &params).unwrap();
        assert_eq!(rebuilt, "https://example.com/?q=a+b%26c%3Dd");
    }

    #[test]
    fn test_generate_invalid_base() {
        let err = generate_modified_url("not a url", &ParameterMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(err.to_string().starts_with("Invalid URL format"));
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let urls = [
            "https://example.com/?a=1&b=two%20words",
            "https://example.com/p?x=%26&y=%3D&z=",
            "http://localhost:8080/?k=v&k=w#frag",
            "https://example.com/",
        ];
        for url in urls {
            let params = extract_parameters(url);
            let rebuilt = generate_modified_url(url, &params).unwrap();
            assert_eq!(extract_parameters(&rebuilt), params, "round trip of {url}");
        }
    }

    #[test]
    fn test_remove_tracking_params() {
        let cleaned = remove_tracking_params(
            "https://shop.example/item?id=7&utm_source=news&utm_campaign=fall#reviews",
            &COMMON_UTM_PARAMETERS,
        )
        .unwrap();
        assert_eq!(cleaned, "https://shop.example/item?id=7#reviews");
        assert!(remove_tracking_params("nope", &COMMON_UTM_PARAMETERS).is_err());
    }

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("https://example.com"));
        assert!(!is_valid_url("example.com"));
    }

    #[test]
    fn test_parameter_map_json_keeps_order() {
        let map: ParameterMap = serde_json::from_str(r#"{"z":"1","a":"2"}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn test_parameter_map_remove() {
        let mut map: ParameterMap = vec![("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(map.remove("a"), Some("1".to_string()));
        assert_eq!(map.remove("a"), None);
        assert_eq!(map.len(), 1);
    }
}
