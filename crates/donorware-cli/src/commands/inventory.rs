use donorware_core::{Item, Library, Loan, Transaction};

use crate::app::{login, AppContext};
use crate::cli::{InventoryArgs, InventoryView};
use crate::output::{item_json, item_table, loan_json, loan_table, transaction_json, transaction_table};
use crate::ui::{blank_line, header, print, section, UiContext};

/// One user's contributions, history and current loans.
pub struct Inventory<'a> {
    pub contributed: Vec<&'a Item>,
    pub history: &'a [Transaction],
    pub borrowed: Vec<&'a Loan>,
}

impl<'a> Inventory<'a> {
    pub fn collect(library: &'a Library, username: &str) -> anyhow::Result<Self> {
        Ok(Self {
            contributed: library.contributed_by(username)?,
            history: library.history_for(username)?,
            borrowed: library.active_loans_for(username)?,
        })
    }
}

pub fn handle_inventory(ctx: &AppContext, args: &InventoryArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let library = ctx.load_library()?;
    let user = login(&library, ctx.cli().user.as_deref(), ctx.interactive())?;
    let inventory = Inventory::collect(&library, &user)?;

    if ctx.cli().json {
        println!("{}", serde_json::to_string_pretty(&inventory_json(&library, &inventory, args.view))?);
        return Ok(());
    }
    print(&ui, &header(&ui, "inventory", Some(&user)));
    print_inventory(&ui, &library, &inventory, args.view);
    Ok(())
}

fn shows(view: Option<InventoryView>, section: InventoryView) -> bool {
    view.map_or(true, |v| v == section)
}

fn inventory_json(
    library: &Library,
    inventory: &Inventory<'_>,
    view: Option<InventoryView>,
) -> serde_json::Value {
    let title_of = |id| library.get_item(id).ok().map(|i| i.title.as_str());
    let mut map = serde_json::Map::new();
    if shows(view, InventoryView::Contributed) {
        let items: Vec<_> = inventory.contributed.iter().map(|item| item_json(item)).collect();
        map.insert("contributed".into(), items.into());
    }
    if shows(view, InventoryView::History) {
        let history: Vec<_> = inventory.history.iter().map(transaction_json).collect();
        map.insert("history".into(), history.into());
    }
    if shows(view, InventoryView::Borrowed) {
        let loans: Vec<_> = inventory
            .borrowed
            .iter()
            .map(|loan| loan_json(loan, title_of(loan.item_id), None))
            .collect();
        map.insert("borrowed".into(), loans.into());
    }
    serde_json::Value::Object(map)
}

/// Print the requested inventory sections (all when `view` is `None`).
pub fn print_inventory(
    ui: &UiContext,
    library: &Library,
    inventory: &Inventory<'_>,
    view: Option<InventoryView>,
) {
    if shows(view, InventoryView::Contributed) {
        blank_line(ui);
        print(ui, &section(ui, "Contributed"));
        if inventory.contributed.is_empty() {
            print(ui, "No contributions yet.");
        } else {
            print(ui, &item_table(ui, inventory.contributed.iter().copied()));
        }
    }
    if shows(view, InventoryView::History) {
        blank_line(ui);
        print(ui, &section(ui, "History"));
        if inventory.history.is_empty() {
            print(ui, "No borrowing history.");
        } else {
            let title_of =
                |t: &Transaction| library.get_item(t.item_id).ok().map(|i| i.title.as_str());
            print(ui, &transaction_table(ui, inventory.history, title_of));
        }
    }
    if shows(view, InventoryView::Borrowed) {
        blank_line(ui);
        print(ui, &section(ui, "Currently borrowing"));
        if inventory.borrowed.is_empty() {
            print(ui, "Nothing on loan.");
        } else {
            let title_of = |l: &Loan| library.get_item(l.item_id).ok().map(|i| i.title.as_str());
            print(ui, &loan_table(ui, &inventory.borrowed, title_of));
        }
    }
}
