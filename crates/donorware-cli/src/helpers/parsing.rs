//! Parsing helpers for item IDs, item types, attribute fields and dates.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use donorware_core::catalog::DATE_FORMAT;
use donorware_core::{ItemId, ItemKind};

use crate::errors::CliError;

/// Parse an item ID (`7` or `#7`).
pub fn parse_item_id(value: &str) -> anyhow::Result<ItemId> {
    value
        .parse()
        .map_err(|_| CliError::invalid_input(format!("Invalid item ID: {} (expected a number like 7)", value)).into())
}

/// Parse an item type name.
pub fn parse_kind(value: &str) -> anyhow::Result<ItemKind> {
    value.parse().map_err(|_| {
        let names: Vec<&str> = ItemKind::ALL.iter().map(|k| k.as_str()).collect();
        CliError::invalid_input(format!(
            "Unknown item type: {} (use one of: {})",
            value,
            names.join(", ")
        ))
        .into()
    })
}

/// Parse repeated `key=value` arguments into an attribute map.
///
/// Keys are trimmed; values keep inner whitespace. A repeated key keeps the
/// last value.
pub fn parse_fields(fields: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for field in fields {
        let (key, value) = field.split_once('=').ok_or_else(|| {
            CliError::invalid_input(format!("Invalid field: {} (expected KEY=VALUE)", field))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::invalid_input(format!("Invalid field: {} (empty key)", field)).into());
        }
        out.insert(key.to_string(), value.trim().to_string());
    }
    Ok(out)
}

/// Parse a YYYY-MM-DD date.
pub fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        CliError::invalid_input(format!("Invalid date: {} (expected YYYY-MM-DD)", value)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id("7").unwrap().get(), 7);
        assert_eq!(parse_item_id("#12").unwrap().get(), 12);
        assert!(parse_item_id("seven").is_err());
        assert!(parse_item_id("0").is_err());
    }

    #[test]
    fn test_parse_kind_lists_choices_on_error() {
        assert_eq!(parse_kind("manga").unwrap(), ItemKind::Manga);
        let err = parse_kind("scroll").unwrap_err().to_string();
        assert!(err.contains("research_paper"));
    }

    #[test]
    fn test_parse_fields() {
        let fields = vec![
            "author=Frank Herbert".to_string(),
            " genre = Science Fiction ".to_string(),
            "note=a=b".to_string(),
        ];
        let map = parse_fields(&fields).unwrap();
        assert_eq!(map["author"], "Frank Herbert");
        assert_eq!(map["genre"], "Science Fiction");
        assert_eq!(map["note"], "a=b");
    }

    #[test]
    fn test_parse_fields_rejects_missing_equals() {
        assert!(parse_fields(&["author".to_string()]).is_err());
        assert!(parse_fields(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_date("15/03/2024").is_err());
    }
}
