//! Item catalog: item types, their attributes, and the ordered item store.
//!
//! Every item shares a common record (id, title, contributor, status) and
//! carries a type-specific attribute payload in [`ItemDetails`]. The type tag
//! is derived from the payload, so the two can never disagree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DonorError, Result};

/// Format accepted for date attributes (publication dates).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Catalog identifier for an item. Assigned sequentially, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = DonorError;

    fn from_str(s: &str) -> Result<Self> {
        let value: u64 = s
            .trim()
            .trim_start_matches('#')
            .parse()
            .map_err(|_| DonorError::Validation(format!("Invalid item ID: {}", s)))?;
        if value == 0 {
            return Err(DonorError::Validation("Item IDs start at 1".to_string()));
        }
        Ok(Self(value))
    }
}

/// The six kinds of literary item the catalog accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Book,
    Magazine,
    Journal,
    Manga,
    WesternComic,
    ResearchPaper,
}

impl ItemKind {
    /// All kinds, in menu order.
    pub const ALL: [ItemKind; 6] = [
        ItemKind::Book,
        ItemKind::Magazine,
        ItemKind::Journal,
        ItemKind::Manga,
        ItemKind::WesternComic,
        ItemKind::ResearchPaper,
    ];

    /// Stable wire name (used in storage and on the command line).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Magazine => "magazine",
            Self::Journal => "journal",
            Self::Manga => "manga",
            Self::WesternComic => "western_comic",
            Self::ResearchPaper => "research_paper",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::Magazine => "Magazine",
            Self::Journal => "Journal",
            Self::Manga => "Manga",
            Self::WesternComic => "Western Comic",
            Self::ResearchPaper => "Research Paper",
        }
    }

    /// Type-specific attribute names accepted for this kind, in prompt order.
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Book => &["author", "genre", "date"],
            Self::Magazine => &["publisher", "genre", "date"],
            Self::Journal => &["author", "journal_name", "volume", "issue", "format"],
            Self::Manga => &["author", "publisher", "format"],
            Self::WesternComic => &["author", "publisher", "format"],
            Self::ResearchPaper => &["author", "journal_name", "abstract", "keywords", "date"],
        }
    }

    /// Attributes that must be present and non-blank.
    pub fn required_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Book => &["author"],
            Self::Magazine => &["publisher"],
            Self::Journal => &["journal_name"],
            Self::Manga => &["author"],
            Self::WesternComic => &["publisher"],
            Self::ResearchPaper => &["author"],
        }
    }

    /// Whether `name` is a date attribute for this kind.
    pub fn is_date_attribute(&self, name: &str) -> bool {
        name == "date" && self.attributes().contains(&"date")
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = DonorError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "book" => Ok(Self::Book),
            "magazine" => Ok(Self::Magazine),
            "journal" => Ok(Self::Journal),
            "manga" => Ok(Self::Manga),
            "western_comic" | "comic" => Ok(Self::WesternComic),
            "research_paper" | "paper" => Ok(Self::ResearchPaper),
            _ => Err(DonorError::Validation(format!(
                "Unknown item type \"{}\" (expected one of: {})",
                s,
                ItemKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Whether an item can currently be borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Borrowed,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Borrowed => "borrowed",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = DonorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "borrowed" => Ok(Self::Borrowed),
            other => Err(DonorError::Validation(format!(
                "Unknown availability \"{}\" (use available or borrowed)",
                other
            ))),
        }
    }
}

/// Type-specific attribute payload. The variant is the item's type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDetails {
    Book {
        author: String,
        genre: Option<String>,
        date: Option<NaiveDate>,
    },
    Magazine {
        publisher: String,
        genre: Option<String>,
        date: Option<NaiveDate>,
    },
    Journal {
        author: Option<String>,
        journal_name: String,
        volume: Option<String>,
        issue: Option<String>,
        format: Option<String>,
    },
    Manga {
        author: String,
        publisher: Option<String>,
        format: Option<String>,
    },
    WesternComic {
        author: Option<String>,
        publisher: String,
        format: Option<String>,
    },
    ResearchPaper {
        author: String,
        journal_name: Option<String>,
        #[serde(rename = "abstract")]
        summary: Option<String>,
        keywords: Option<String>,
        date: Option<NaiveDate>,
    },
}

/// Reads named attribute values for one kind, applying blank/required/date rules.
struct AttributeReader<'a> {
    kind: ItemKind,
    values: &'a BTreeMap<String, String>,
}

impl AttributeReader<'_> {
    fn optional(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(String::from)
    }

    fn required(&self, name: &str) -> Result<String> {
        self.optional(name).ok_or_else(|| {
            DonorError::Validation(format!(
                "{} requires a non-empty \"{}\" attribute",
                self.kind.label(),
                name
            ))
        })
    }

    fn date(&self, name: &str) -> Result<Option<NaiveDate>> {
        match self.optional(name) {
            None => Ok(None),
            Some(value) => NaiveDate::parse_from_str(&value, DATE_FORMAT)
                .map(Some)
                .map_err(|_| {
                    DonorError::Validation(format!(
                        "Invalid {} \"{}\" (expected YYYY-MM-DD, e.g. 2014-12-14)",
                        name, value
                    ))
                }),
        }
    }
}

impl ItemDetails {
    /// Build the payload for `kind` from raw `name -> value` attributes.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Validation` if an attribute name is unknown for
    /// this kind, a required attribute is missing or blank, or a date does
    /// not parse.
    pub fn from_attributes(kind: ItemKind, attributes: &BTreeMap<String, String>) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (name, value) in attributes {
            let key = name.trim().to_lowercase();
            if !kind.attributes().contains(&key.as_str()) {
                return Err(DonorError::Validation(format!(
                    "Unknown attribute \"{}\" for {} (expected: {})",
                    name,
                    kind.as_str(),
                    kind.attributes().join(", ")
                )));
            }
            if values.insert(key, value.clone()).is_some() {
                return Err(DonorError::Validation(format!(
                    "duplicate attribute \"{}\" for {}",
                    name.trim().to_lowercase(),
                    kind.as_str()
                )));
            }
        }
        let reader = AttributeReader {
            kind,
            values: &values,
        };

        let details = match kind {
            ItemKind::Book => Self::Book {
                author: reader.required("author")?,
                genre: reader.optional("genre"),
                date: reader.date("date")?,
            },
            ItemKind::Magazine => Self::Magazine {
                publisher: reader.required("publisher")?,
                genre: reader.optional("genre"),
                date: reader.date("date")?,
            },
            ItemKind::Journal => Self::Journal {
                author: reader.optional("author"),
                journal_name: reader.required("journal_name")?,
                volume: reader.optional("volume"),
                issue: reader.optional("issue"),
                format: reader.optional("format"),
            },
            ItemKind::Manga => Self::Manga {
                author: reader.required("author")?,
                publisher: reader.optional("publisher"),
                format: reader.optional("format"),
            },
            ItemKind::WesternComic => Self::WesternComic {
                author: reader.optional("author"),
                publisher: reader.required("publisher")?,
                format: reader.optional("format"),
            },
            ItemKind::ResearchPaper => Self::ResearchPaper {
                author: reader.required("author")?,
                journal_name: reader.optional("journal_name"),
                summary: reader.optional("abstract"),
                keywords: reader.optional("keywords"),
                date: reader.date("date")?,
            },
        };
        Ok(details)
    }

    /// The type tag carried by this payload.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Book { .. } => ItemKind::Book,
            Self::Magazine { .. } => ItemKind::Magazine,
            Self::Journal { .. } => ItemKind::Journal,
            Self::Manga { .. } => ItemKind::Manga,
            Self::WesternComic { .. } => ItemKind::WesternComic,
            Self::ResearchPaper { .. } => ItemKind::ResearchPaper,
        }
    }

    /// Present attributes as `(name, value)` pairs, in the kind's attribute order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        fn push(out: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&str>) {
            if let Some(v) = value {
                out.push((name, v.to_string()));
            }
        }
        fn push_date(out: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<NaiveDate>) {
            if let Some(d) = value {
                out.push((name, d.format(DATE_FORMAT).to_string()));
            }
        }

        let mut out = Vec::new();
        match self {
            Self::Book {
                author,
                genre,
                date,
            } => {
                push(&mut out, "author", Some(author.as_str()));
                push(&mut out, "genre", genre.as_deref());
                push_date(&mut out, "date", *date);
            }
            Self::Magazine {
                publisher,
                genre,
                date,
            } => {
                push(&mut out, "publisher", Some(publisher.as_str()));
                push(&mut out, "genre", genre.as_deref());
                push_date(&mut out, "date", *date);
            }
            Self::Journal {
                author,
                journal_name,
                volume,
                issue,
                format,
            } => {
                push(&mut out, "author", author.as_deref());
                push(&mut out, "journal_name", Some(journal_name.as_str()));
                push(&mut out, "volume", volume.as_deref());
                push(&mut out, "issue", issue.as_deref());
                push(&mut out, "format", format.as_deref());
            }
            Self::Manga {
                author,
                publisher,
                format,
            } => {
                push(&mut out, "author", Some(author.as_str()));
                push(&mut out, "publisher", publisher.as_deref());
                push(&mut out, "format", format.as_deref());
            }
            Self::WesternComic {
                author,
                publisher,
                format,
            } => {
                push(&mut out, "author", author.as_deref());
                push(&mut out, "publisher", Some(publisher.as_str()));
                push(&mut out, "format", format.as_deref());
            }
            Self::ResearchPaper {
                author,
                journal_name,
                summary,
                keywords,
                date,
            } => {
                push(&mut out, "author", Some(author.as_str()));
                push(&mut out, "journal_name", journal_name.as_deref());
                push(&mut out, "abstract", summary.as_deref());
                push(&mut out, "keywords", keywords.as_deref());
                push_date(&mut out, "date", *date);
            }
        }
        out
    }
}

/// A catalogued item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Catalog identifier
    pub id: ItemId,

    /// Title (the item's mandatory name)
    pub title: String,

    /// Username of the contributing (owning) user
    pub contributor: String,

    /// Type tag and type-specific attributes
    pub details: ItemDetails,

    /// Whether the item is on loan
    pub status: Availability,

    /// When the item was added to the catalog
    pub added_at: DateTime<Utc>,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        self.details.kind()
    }

    pub fn is_available(&self) -> bool {
        self.status == Availability::Available
    }

    /// Look up a single type-specific attribute by name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.details
            .attributes()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Builder for items about to be added to the catalog.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Item type
    pub kind: ItemKind,

    /// Title
    pub title: String,

    /// Raw type-specific attributes, validated on insert
    pub attributes: BTreeMap<String, String>,
}

impl NewItem {
    pub fn new(kind: ItemKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in attributes {
            self.attributes.insert(name.into(), value.into());
        }
        self
    }
}

/// Ordered item store. Items are kept in insertion order, which is also
/// ascending id order.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    next_id: u64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from persisted items.
    pub(crate) fn from_parts(mut items: Vec<Item>, next_id: u64) -> Self {
        items.sort_by_key(|item| item.id);
        Self { items, next_id }
    }

    /// Validate and append a new item, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Validation` if the title is blank or the
    /// attributes do not satisfy the item kind.
    pub(crate) fn insert(
        &mut self,
        new_item: &NewItem,
        contributor: &str,
        added_at: DateTime<Utc>,
    ) -> Result<ItemId> {
        let title = new_item.title.trim();
        if title.is_empty() {
            return Err(DonorError::Validation(format!(
                "{} title cannot be empty",
                new_item.kind.label()
            )));
        }
        let details = ItemDetails::from_attributes(new_item.kind, &new_item.attributes)?;

        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.push(Item {
            id,
            title: title.to_string(),
            contributor: contributor.to_string(),
            details,
            status: Availability::Available,
            added_at,
        });
        Ok(id)
    }

    /// Get an item by id.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotFound` if no item has this id.
    pub fn get(&self, id: ItemId) -> Result<&Item> {
        self.position(id).map(|index| &self.items[index])
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        let index = self.position(id)?;
        Ok(&mut self.items[index])
    }

    fn position(&self, id: ItemId) -> Result<usize> {
        self.items
            .binary_search_by_key(&id, |item| item.id)
            .map_err(|_| DonorError::NotFound(format!("item {}", id)))
    }

    /// Items contributed by `username`, in insertion order.
    pub fn contributed_by<'a>(&'a self, username: &str) -> impl Iterator<Item = &'a Item> + 'a {
        let username = username.to_string();
        self.items
            .iter()
            .filter(move |item| item.contributor == username)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The id the next inserted item will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_book_from_attributes() {
        let details = ItemDetails::from_attributes(
            ItemKind::Book,
            &attrs(&[("author", "Frank Herbert"), ("date", "1965-08-01")]),
        )
        .unwrap();
        assert_eq!(details.kind(), ItemKind::Book);
        assert_eq!(
            details.attributes(),
            vec![
                ("author", "Frank Herbert".to_string()),
                ("date", "1965-08-01".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_required_attribute_is_validation_error() {
        let err = ItemDetails::from_attributes(ItemKind::Magazine, &attrs(&[("genre", "news")]))
            .unwrap_err();
        assert!(matches!(err, DonorError::Validation(_)));
        assert!(err.to_string().contains("publisher"));
    }

    #[test]
    fn test_blank_required_attribute_is_rejected() {
        let err = ItemDetails::from_attributes(ItemKind::Manga, &attrs(&[("author", "   ")]))
            .unwrap_err();
        assert!(matches!(err, DonorError::Validation(_)));
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let err = ItemDetails::from_attributes(
            ItemKind::Book,
            &attrs(&[("author", "A"), ("issue", "4")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown attribute \"issue\""));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let err = ItemDetails::from_attributes(
            ItemKind::ResearchPaper,
            &attrs(&[("author", "Turing"), ("date", "14/12/2014")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_blank_optional_attribute_is_absent() {
        let details = ItemDetails::from_attributes(
            ItemKind::Journal,
            &attrs(&[("journal_name", "Nature"), ("volume", "")]),
        )
        .unwrap();
        assert_eq!(details.attributes(), vec![("journal_name", "Nature".to_string())]);
    }

    #[test]
    fn test_attribute_names_are_case_insensitive() {
        let details =
            ItemDetails::from_attributes(ItemKind::WesternComic, &attrs(&[(" Publisher ", "DC")]))
                .unwrap();
        assert_eq!(details.kind(), ItemKind::WesternComic);
    }

    #[test]
    fn test_case_variants_of_one_attribute_are_rejected() {
        let err = ItemDetails::from_attributes(
            ItemKind::Book,
            &attrs(&[("AUTHOR", "Frank Herbert"), ("author", "")]),
        )
        .unwrap_err();
        assert!(matches!(err, DonorError::Validation(_)));
        assert!(err.to_string().contains("duplicate attribute \"author\""));
    }

    #[test]
    fn test_details_serialize_with_kind_tag() {
        let details = ItemDetails::ResearchPaper {
            author: "Shannon".to_string(),
            journal_name: None,
            summary: Some("Information".to_string()),
            keywords: None,
            date: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["kind"], "research_paper");
        assert_eq!(json["abstract"], "Information");
    }

    #[test]
    fn test_kind_parsing_accepts_aliases() {
        assert_eq!("Western Comic".parse::<ItemKind>().unwrap(), ItemKind::WesternComic);
        assert_eq!("research-paper".parse::<ItemKind>().unwrap(), ItemKind::ResearchPaper);
        assert!("scroll".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_item_id_parsing() {
        assert_eq!("#7".parse::<ItemId>().unwrap(), ItemId::new(7));
        assert!("0".parse::<ItemId>().is_err());
        assert!("seven".parse::<ItemId>().is_err());
    }

    #[test]
    fn test_catalog_assigns_sequential_ids() {
        let mut catalog = Catalog::new();
        let now = Utc::now();
        let first = catalog
            .insert(&NewItem::new(ItemKind::Book, "Dune").with_attribute("author", "Herbert"), "alice", now)
            .unwrap();
        let second = catalog
            .insert(&NewItem::new(ItemKind::Manga, "Akira").with_attribute("author", "Otomo"), "bob", now)
            .unwrap();

        assert_eq!(first, ItemId::new(1));
        assert_eq!(second, ItemId::new(2));
        assert_eq!(catalog.get(second).unwrap().title, "Akira");
        assert_eq!(catalog.contributed_by("alice").count(), 1);
        assert_eq!(catalog.next_id(), 3);
    }

    #[test]
    fn test_catalog_rejects_blank_title_without_consuming_id() {
        let mut catalog = Catalog::new();
        let result = catalog.insert(
            &NewItem::new(ItemKind::Book, "  ").with_attribute("author", "Anon"),
            "alice",
            Utc::now(),
        );
        assert!(matches!(result, Err(DonorError::Validation(_))));
        assert_eq!(catalog.next_id(), 1);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_catalog_get_unknown_is_not_found() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.get(ItemId::new(42)),
            Err(DonorError::NotFound(_))
        ));
    }
}
