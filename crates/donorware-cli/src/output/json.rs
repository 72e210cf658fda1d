//! JSON output for items, loans and history.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use donorware_core::{Item, Loan, Transaction};

/// Convert an item to JSON, flattening its type-specific attributes.
pub fn item_json(item: &Item) -> Value {
    let attributes: Map<String, Value> = item
        .details
        .attributes()
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::String(value)))
        .collect();
    json!({
        "id": item.id.get(),
        "type": item.kind().as_str(),
        "title": item.title,
        "contributor": item.contributor,
        "status": item.status,
        "added_at": item.added_at,
        "attributes": attributes,
    })
}

pub fn items_json<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Value> {
    items.into_iter().map(item_json).collect()
}

/// Convert a loan to JSON. `as_of` adds the overdue fields.
pub fn loan_json(loan: &Loan, title: Option<&str>, as_of: Option<NaiveDate>) -> Value {
    let mut value = json!({
        "item_id": loan.item_id.get(),
        "title": title,
        "borrower": loan.borrower,
        "borrowed_on": loan.borrowed_on,
        "due_on": loan.due_on,
    });
    if let (Some(as_of), Some(map)) = (as_of, value.as_object_mut()) {
        map.insert("overdue".into(), Value::Bool(loan.is_overdue(as_of)));
        map.insert("days_overdue".into(), json!(loan.days_overdue(as_of).max(0)));
    }
    value
}

pub fn transaction_json(transaction: &Transaction) -> Value {
    json!({
        "id": transaction.id,
        "item_id": transaction.item_id.get(),
        "kind": transaction.kind,
        "date": transaction.date,
        "due_date": transaction.due_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorware_core::{ItemKind, LendingPolicy, Library, NewItem};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_item_json_flattens_attributes() {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "pw").unwrap();
        let id = library
            .add_item(
                &NewItem::new(ItemKind::Book, "Dune").with_attribute("author", "Frank Herbert"),
                "alice",
            )
            .unwrap();

        let value = item_json(library.get_item(id).unwrap());
        assert_eq!(value["id"], 1);
        assert_eq!(value["type"], "book");
        assert_eq!(value["status"], "available");
        assert_eq!(value["attributes"]["author"], "Frank Herbert");
    }

    #[test]
    fn test_loan_json_overdue_fields() {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "pw").unwrap();
        library.register("bob", "pw").unwrap();
        let id = library
            .add_item(
                &NewItem::new(ItemKind::Magazine, "Wired").with_attribute("publisher", "Conde Nast"),
                "alice",
            )
            .unwrap();
        let loan = library.borrow_on(id, "bob", date(2024, 1, 1)).unwrap();

        let value = loan_json(&loan, Some("Wired"), Some(date(2024, 1, 20)));
        assert_eq!(value["due_on"], "2024-01-15");
        assert_eq!(value["overdue"], true);
        assert_eq!(value["days_overdue"], 5);

        let value = loan_json(&loan, None, None);
        assert!(value.get("overdue").is_none());
    }
}
