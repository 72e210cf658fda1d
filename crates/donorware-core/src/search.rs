//! Linear attribute filtering over the catalog.
//!
//! A [`Search`] walks the catalog slice lazily and yields the items accepted
//! by a [`Predicate`]. Results keep catalog insertion order. Cloning a search
//! before consuming it restarts it from the beginning.

use crate::catalog::{Availability, Item, ItemKind};

/// Anything that can accept or reject an item.
pub trait Predicate {
    fn matches(&self, item: &Item) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&Item) -> bool,
{
    fn matches(&self, item: &Item) -> bool {
        self(item)
    }
}

/// Conjunction of optional attribute conditions.
///
/// Text conditions are case-insensitive substring matches. An empty filter
/// accepts every item.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Item type
    pub kind: Option<ItemKind>,

    /// Substring of the title
    pub title: Option<String>,

    /// Exact contributor username
    pub contributor: Option<String>,

    /// Available or borrowed
    pub availability: Option<Availability>,

    /// Substring of the title, contributor or any type-specific attribute
    pub text: Option<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into().to_lowercase());
        self
    }

    pub fn contributor(mut self, contributor: impl Into<String>) -> Self {
        self.contributor = Some(contributor.into());
        self
    }

    pub fn availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into().to_lowercase());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.contributor.is_none()
            && self.availability.is_none()
            && self.text.is_none()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Predicate for SearchFilter {
    fn matches(&self, item: &Item) -> bool {
        if let Some(kind) = self.kind {
            if item.kind() != kind {
                return false;
            }
        }
        if let Some(ref title) = self.title {
            if !contains_ignore_case(&item.title, title) {
                return false;
            }
        }
        if let Some(ref contributor) = self.contributor {
            if &item.contributor != contributor {
                return false;
            }
        }
        if let Some(availability) = self.availability {
            if item.status != availability {
                return false;
            }
        }
        if let Some(ref text) = self.text {
            let hit = contains_ignore_case(&item.title, text)
                || contains_ignore_case(&item.contributor, text)
                || item
                    .details
                    .attributes()
                    .iter()
                    .any(|(_, value)| contains_ignore_case(value, text));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Lazy, restartable sequence of matching items.
pub struct Search<'a, P: ?Sized> {
    items: std::slice::Iter<'a, Item>,
    predicate: &'a P,
}

impl<'a, P: Predicate + ?Sized> Search<'a, P> {
    pub fn new(items: &'a [Item], predicate: &'a P) -> Self {
        Self {
            items: items.iter(),
            predicate,
        }
    }
}

impl<P: ?Sized> Clone for Search<'_, P> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            predicate: self.predicate,
        }
    }
}

impl<'a, P: Predicate + ?Sized> Iterator for Search<'a, P> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<Self::Item> {
        let predicate = self.predicate;
        self.items.by_ref().find(|item| predicate.matches(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.items.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::catalog::{ItemDetails, ItemId};

    fn item(id: u64, title: &str, contributor: &str, details: ItemDetails) -> Item {
        Item {
            id: ItemId::new(id),
            title: title.to_string(),
            contributor: contributor.to_string(),
            details,
            status: Availability::Available,
            added_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            item(
                1,
                "Dune",
                "alice",
                ItemDetails::Book {
                    author: "Frank Herbert".to_string(),
                    genre: Some("Science Fiction".to_string()),
                    date: None,
                },
            ),
            item(
                2,
                "Akira",
                "bob",
                ItemDetails::Manga {
                    author: "Katsuhiro Otomo".to_string(),
                    publisher: Some("Kodansha".to_string()),
                    format: None,
                },
            ),
            item(
                3,
                "Children of Dune",
                "bob",
                ItemDetails::Book {
                    author: "Frank Herbert".to_string(),
                    genre: None,
                    date: None,
                },
            ),
        ]
    }

    fn ids<'a>(search: impl Iterator<Item = &'a Item>) -> Vec<u64> {
        search.map(|item| item.id.get()).collect()
    }

    #[test]
    fn test_empty_filter_matches_everything_in_order() {
        let items = sample();
        let filter = SearchFilter::new();
        assert!(filter.is_empty());
        assert_eq!(ids(Search::new(&items, &filter)), vec![1, 2, 3]);
    }

    #[test]
    fn test_title_is_case_insensitive_substring() {
        let items = sample();
        let filter = SearchFilter::new().title("DUNE");
        assert_eq!(ids(Search::new(&items, &filter)), vec![1, 3]);
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let items = sample();
        let filter = SearchFilter::new().title("dune").contributor("bob");
        assert_eq!(ids(Search::new(&items, &filter)), vec![3]);
    }

    #[test]
    fn test_text_matches_type_specific_attributes() {
        let items = sample();
        let filter = SearchFilter::new().text("kodansha");
        assert_eq!(ids(Search::new(&items, &filter)), vec![2]);

        let filter = SearchFilter::new().text("herbert").kind(ItemKind::Book);
        assert_eq!(ids(Search::new(&items, &filter)), vec![1, 3]);
    }

    #[test]
    fn test_availability_filter() {
        let mut items = sample();
        items[1].status = Availability::Borrowed;
        let filter = SearchFilter::new().availability(Availability::Available);
        assert_eq!(ids(Search::new(&items, &filter)), vec![1, 3]);
    }

    #[test]
    fn test_closure_predicate_and_restart() {
        let items = sample();
        let predicate = |item: &Item| item.id.get() % 2 == 1;
        let search = Search::new(&items, &predicate);
        let again = search.clone();
        assert_eq!(ids(search), vec![1, 3]);
        assert_eq!(ids(again), vec![1, 3]);
    }
}
