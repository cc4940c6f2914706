//! Raw JSON view of the tracking-parameter list, as shown and edited on the
//! options surface.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::TrackingParameterList;

/// Pretty-printed JSON array with two-space indentation.
pub fn render_json_view(list: &TrackingParameterList) -> String {
    serde_json::to_string_pretty(list.as_slice()).unwrap_or_else(|_| "[]".to_string())
}

/// Parses a user-edited view back into a list.
///
/// On error the caller is expected to keep its previous list.
pub fn parse_json_view(text: &str) -> Result<TrackingParameterList> {
    let value: Value = serde_json::from_str(text).map_err(Error::InvalidJson)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(Error::NotAnArray),
    };

    let mut names = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::String(name) => names.push(name),
            _ => return Err(Error::NonStringEntry { index }),
        }
    }

    Ok(TrackingParameterList::from_names(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pretty() {
        let list = TrackingParameterList::from_names(["utm_source", "fbclid"]);
        assert_eq!(render_json_view(&list), "[\n  \"utm_source\",\n  \"fbclid\"\n]");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_json_view(&TrackingParameterList::new()), "[]");
    }

    #[test]
    fn test_parse_round_trip() {
        let list = TrackingParameterList::from_names(["a", "b"]);
        assert_eq!(parse_json_view(&render_json_view(&list)).unwrap(), list);
    }

    #[test]
    fn test_parse_normalizes_entries() {
        let list = parse_json_view(r#"[" gclid", "", "gclid", "ref "]"#).unwrap();
        assert_eq!(list, TrackingParameterList::from_names(["gclid", "ref"]));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = parse_json_view("[\"a\",").unwrap_err();
        assert!(matches!(err, Error::InvalidJson(_)));
        assert_eq!(err.to_string(), "Invalid JSON format");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(parse_json_view(r#"{"a":1}"#), Err(Error::NotAnArray)));
        assert!(matches!(parse_json_view(r#""utm_source""#), Err(Error::NotAnArray)));
    }

    #[test]
    fn test_parse_rejects_non_string_entry() {
        assert!(matches!(
            parse_json_view(r#"["a", 3]"#),
            Err(Error::NonStringEntry { index: 1 })
        ));
    }
}
