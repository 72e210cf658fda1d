//! Text and table output for items, loans and history.

use chrono::NaiveDate;

use donorware_core::{Item, Loan, Transaction};

use crate::ui::format::single_line;
use crate::ui::{format_date, format_datetime, kv, short_id, table, truncate, Column, UiContext};

const TITLE_WIDTH: usize = 40;

/// Detail block for a single item.
pub fn item_detail(ctx: &UiContext, item: &Item, loan: Option<&Loan>) -> String {
    let pretty = ctx.mode.is_pretty();
    let mut lines = vec![
        kv(ctx, "ID", &item.id.to_string()),
        kv(ctx, "Type", item.kind().label()),
        kv(ctx, "Title", &item.title),
        kv(ctx, "Contributor", &item.contributor),
        kv(ctx, "Status", item.status.as_str()),
        kv(ctx, "Added", &format_datetime(&item.added_at, pretty)),
    ];
    for (name, value) in item.details.attributes() {
        lines.push(kv(ctx, &attribute_label(name), &single_line(&value)));
    }
    if let Some(loan) = loan {
        lines.push(kv(ctx, "Borrower", &loan.borrower));
        lines.push(kv(ctx, "Due", &format_date(loan.due_on)));
    }
    lines.join("\n")
}

/// Table of items: ID, type, title, contributor, status.
pub fn item_table<'a>(ctx: &UiContext, items: impl IntoIterator<Item = &'a Item>) -> String {
    let columns = [
        Column::new("ID"),
        Column::new("Type"),
        Column::new("Title"),
        Column::new("Contributor"),
        Column::new("Status"),
    ];
    let rows: Vec<Vec<String>> = items
        .into_iter()
        .map(|item| {
            vec![
                item.id.to_string(),
                item.kind().as_str().to_string(),
                truncate(&single_line(&item.title), TITLE_WIDTH),
                item.contributor.clone(),
                item.status.as_str().to_string(),
            ]
        })
        .collect();
    table(ctx, &columns, &rows)
}

/// Table of active loans. `title_of` looks up an item title.
pub fn loan_table<'a, F>(ctx: &UiContext, loans: &[&Loan], title_of: F) -> String
where
    F: Fn(&Loan) -> Option<&'a str>,
{
    let columns = [
        Column::new("ID"),
        Column::new("Title"),
        Column::new("Borrowed"),
        Column::new("Due"),
    ];
    let rows: Vec<Vec<String>> = loans
        .iter()
        .map(|&loan| {
            vec![
                loan.item_id.to_string(),
                truncate(title_of(loan).unwrap_or("?"), TITLE_WIDTH),
                format_date(loan.borrowed_on),
                format_date(loan.due_on),
            ]
        })
        .collect();
    table(ctx, &columns, &rows)
}

/// Table of overdue loans as of a date.
pub fn overdue_table<'a, F>(ctx: &UiContext, loans: &[&Loan], as_of: NaiveDate, title_of: F) -> String
where
    F: Fn(&Loan) -> Option<&'a str>,
{
    let columns = [
        Column::new("ID"),
        Column::new("Title"),
        Column::new("Borrower"),
        Column::new("Due"),
        Column::new("Days Late"),
    ];
    let rows: Vec<Vec<String>> = loans
        .iter()
        .map(|&loan| {
            vec![
                loan.item_id.to_string(),
                truncate(title_of(loan).unwrap_or("?"), TITLE_WIDTH),
                loan.borrower.clone(),
                format_date(loan.due_on),
                loan.days_overdue(as_of).to_string(),
            ]
        })
        .collect();
    table(ctx, &columns, &rows)
}

/// Table of a user's borrow and return history.
pub fn transaction_table<'a, F>(ctx: &UiContext, history: &[Transaction], title_of: F) -> String
where
    F: Fn(&Transaction) -> Option<&'a str>,
{
    let columns = [
        Column::new("Date"),
        Column::new("Action"),
        Column::new("ID"),
        Column::new("Title"),
        Column::new("Due"),
        Column::new("Ref"),
    ];
    let rows: Vec<Vec<String>> = history
        .iter()
        .map(|t| {
            vec![
                format_date(t.date),
                t.kind.as_str().to_string(),
                t.item_id.to_string(),
                truncate(title_of(t).unwrap_or("?"), TITLE_WIDTH),
                t.due_date.map(format_date).unwrap_or_default(),
                short_id(&t.id),
            ]
        })
        .collect();
    table(ctx, &columns, &rows)
}

fn attribute_label(name: &str) -> String {
    let mut label = name.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;
    use donorware_core::{ItemKind, LendingPolicy, Library, NewItem};

    fn plain_ctx() -> UiContext {
        UiContext {
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
        }
    }

    #[test]
    fn test_attribute_label() {
        assert_eq!(attribute_label("journal_name"), "Journal name");
        assert_eq!(attribute_label("author"), "Author");
    }

    #[test]
    fn test_item_detail_plain() {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "pw").unwrap();
        let id = library
            .add_item(
                &NewItem::new(ItemKind::Journal, "Nature 7001")
                    .with_attribute("journal_name", "Nature"),
                "alice",
            )
            .unwrap();

        let text = item_detail(&plain_ctx(), library.get_item(id).unwrap(), None);
        assert!(text.contains("title=Nature 7001"));
        assert!(text.contains("journal_name=Nature"));
        assert!(text.contains("status=available"));
    }

    #[test]
    fn test_item_table_plain_is_tab_separated() {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "pw").unwrap();
        library
            .add_item(
                &NewItem::new(ItemKind::Manga, "Akira").with_attribute("author", "Otomo"),
                "alice",
            )
            .unwrap();

        let text = item_table(&plain_ctx(), library.catalog().iter());
        assert_eq!(text, "1\tmanga\tAkira\talice\tavailable");
    }
}
