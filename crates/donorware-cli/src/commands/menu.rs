//! Interactive console menu.
//!
//! Guests can register, log in or exit. A logged-in member can add items,
//! search, borrow, return and view their inventory. Borrowing always picks
//! from a listed set of items, either everything on the shelf or the results
//! of a search. The library is saved after every change; recoverable errors
//! are shown and the loop goes on.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use tracing::{debug, info};

use donorware_core::{
    Availability, Item, ItemId, ItemKind, Library, Loan, NewItem, SearchFilter, StateStore,
};

use crate::app::{login, AppContext};
use crate::errors::{self, CliError};
use crate::helpers::{parse_kind, prompt_new_password, prompt_username};
use crate::output::{item_table, loan_table};
use crate::ui::{
    badge, blank_line, format_date, header, print, print_error, receipt, Badge, UiContext,
};

use super::inventory::{print_inventory, Inventory};

const GUEST_ACTIONS: [&str; 3] = ["Register", "Login", "Exit"];
const MEMBER_ACTIONS: [&str; 6] = [
    "Add Item",
    "Search",
    "Borrow",
    "Return",
    "View Personal Inventory",
    "Log out",
];
const SEARCH_MODES: [&str; 6] = [
    "All items",
    "By title",
    "By type",
    "By contributor",
    "Available only",
    "Any text",
];

enum Flow {
    Continue,
    Exit,
}

struct Session<'a> {
    app: &'a AppContext<'a>,
    ui: UiContext,
    theme: ColorfulTheme,
    library: Library,
    user: Option<String>,
}

pub fn handle_menu(ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.interactive() {
        return Err(CliError::invalid_input(
            "The menu needs a terminal. Use subcommands instead (see `donorware --help`).",
        )
        .into());
    }

    let store = ctx.store()?;
    if !store.exists() {
        store.create()?;
        info!(store = %store.path().display(), "created store for menu session");
    }

    let mut session = Session {
        app: ctx,
        ui: ctx.ui_context(),
        theme: ColorfulTheme::default(),
        library: ctx.load_library()?,
        user: None,
    };
    print(&session.ui, &header(&session.ui, "menu", None));

    loop {
        let step = match session.user.clone() {
            None => session.guest_step(),
            Some(user) => session.member_step(&user),
        };
        match step {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => return Ok(()),
            Err(err) if !errors::is_fatal(&err) => {
                let hint = errors::hint(&err);
                print_error(&session.ui, &err.to_string(), hint.as_deref());
            }
            Err(err) => return Err(err),
        }
    }
}

impl Session<'_> {
    fn choose(&self, prompt: &str, items: &[&str]) -> anyhow::Result<usize> {
        blank_line(&self.ui);
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?)
    }

    fn save(&self) -> anyhow::Result<()> {
        self.app.save_library(&self.library)
    }

    fn guest_step(&mut self) -> anyhow::Result<Flow> {
        match self.choose("DonorWare", &GUEST_ACTIONS)? {
            0 => {
                let username = prompt_username(None, true)?;
                let password = prompt_new_password(true)?;
                self.library.register(&username, &password)?;
                self.save()?;
                info!(user = %username, "registered user");
                print(&self.ui, &receipt(&self.ui, "Registered", &[("User", &username)]));
            }
            1 => {
                let username = login(&self.library, None, true)?;
                debug!(user = %username, "logged in");
                let welcome = format!("Welcome, {}.", username);
                print(&self.ui, &badge(&self.ui, Badge::Info, &welcome));
                self.user = Some(username);
            }
            _ => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn member_step(&mut self, user: &str) -> anyhow::Result<Flow> {
        let prompt = format!("DonorWare ({})", user);
        match self.choose(&prompt, &MEMBER_ACTIONS)? {
            0 => self.add_item(user)?,
            1 => self.search(user)?,
            2 => self.borrow(user)?,
            3 => self.return_item(user)?,
            4 => {
                let inventory = Inventory::collect(&self.library, user)?;
                print_inventory(&self.ui, &self.library, &inventory, None);
            }
            _ => {
                debug!(user, "logged out");
                self.user = None;
            }
        }
        Ok(Flow::Continue)
    }

    fn add_item(&mut self, user: &str) -> anyhow::Result<()> {
        let labels: Vec<&str> = ItemKind::ALL.iter().map(|k| k.label()).collect();
        let kind = ItemKind::ALL[self.choose("Item type", &labels)?];

        let title: String = Input::with_theme(&self.theme)
            .with_prompt("Title")
            .interact_text()?;
        let mut new_item = NewItem::new(kind, title.trim());
        for &name in kind.attributes() {
            let required = kind.required_attributes().contains(&name);
            let mut prompt = name.replace('_', " ");
            if kind.is_date_attribute(name) {
                prompt.push_str(" (YYYY-MM-DD)");
            }
            if !required {
                prompt.push_str(" [optional]");
            }
            let value: String = Input::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty(!required)
                .interact_text()?;
            if !value.trim().is_empty() {
                new_item = new_item.with_attribute(name, value.trim());
            }
        }

        let id = self.library.add_item(&new_item, user)?;
        self.save()?;
        info!(item = %id, kind = kind.as_str(), contributor = user, "added item");
        let id_text = id.to_string();
        print(
            &self.ui,
            &receipt(&self.ui, "Item added", &[("ID", &id_text), ("Title", &new_item.title)]),
        );
        Ok(())
    }

    fn search(&mut self, user: &str) -> anyhow::Result<()> {
        let filter = match self.choose("Search", &SEARCH_MODES)? {
            0 => SearchFilter::new(),
            1 => SearchFilter::new().title(self.ask("Title contains")?),
            2 => {
                let names: Vec<&str> = ItemKind::ALL.iter().map(|k| k.as_str()).collect();
                let kind = parse_kind(names[self.choose("Item type", &names)?])?;
                SearchFilter::new().kind(kind)
            }
            3 => SearchFilter::new().contributor(self.ask("Contributor")?),
            4 => SearchFilter::new().availability(Availability::Available),
            _ => SearchFilter::new().text(self.ask("Text")?),
        };

        let results: Vec<&Item> = self.library.search(&filter).collect();
        if results.is_empty() {
            print(&self.ui, "No items found.");
            return Ok(());
        }
        let candidates = borrow_candidates(results.iter().copied(), &self.library, user);
        print(&self.ui, &item_table(&self.ui, results));
        if candidates.is_empty() {
            return Ok(());
        }

        blank_line(&self.ui);
        let wants_borrow = Confirm::with_theme(&self.theme)
            .with_prompt("Would you like to borrow from these items?")
            .default(false)
            .interact()?;
        if !wants_borrow {
            print(&self.ui, "Borrowing cancelled.");
            return Ok(());
        }
        let id = self.pick_item("Borrow which item?", &candidates)?;
        self.borrow_item(id, user)
    }

    fn borrow(&mut self, user: &str) -> anyhow::Result<()> {
        let candidates = borrow_candidates(self.library.catalog().iter(), &self.library, user);
        if candidates.is_empty() {
            print(&self.ui, "Nothing is available to borrow.");
            return Ok(());
        }
        let listed: Vec<&Item> = candidates
            .iter()
            .filter_map(|id| self.library.get_item(*id).ok())
            .collect();
        print(&self.ui, &item_table(&self.ui, listed));
        let id = self.pick_item("Borrow which item?", &candidates)?;
        self.borrow_item(id, user)
    }

    fn pick_item(&self, prompt: &str, ids: &[ItemId]) -> anyhow::Result<ItemId> {
        let labels: Vec<String> = ids
            .iter()
            .map(|id| {
                let title = self.library.get_item(*id).map(|i| i.title.as_str()).unwrap_or("?");
                format!("#{} {}", id, title)
            })
            .collect();
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        Ok(ids[self.choose(prompt, &label_refs)?])
    }

    fn borrow_item(&mut self, id: ItemId, user: &str) -> anyhow::Result<()> {
        let loan = self.library.borrow(id, user)?;
        self.save()?;
        info!(item = %id, borrower = user, due = %loan.due_on, "borrowed item");

        let title = self.library.get_item(id)?.title.clone();
        let due = format_date(loan.due_on);
        print(
            &self.ui,
            &receipt(&self.ui, "Borrowed", &[("Title", &title), ("Due", &due)]),
        );
        Ok(())
    }

    fn return_item(&mut self, user: &str) -> anyhow::Result<()> {
        let loans: Vec<Loan> = self
            .library
            .active_loans_for(user)?
            .into_iter()
            .cloned()
            .collect();
        if loans.is_empty() {
            print(&self.ui, "You have nothing on loan.");
            return Ok(());
        }

        let refs: Vec<&Loan> = loans.iter().collect();
        let library = &self.library;
        let title_of = |l: &Loan| library.get_item(l.item_id).ok().map(|i| i.title.as_str());
        print(&self.ui, &loan_table(&self.ui, &refs, title_of));
        let labels: Vec<String> = loans
            .iter()
            .map(|l| format!("#{} {}", l.item_id, title_of(l).unwrap_or("?")))
            .collect();
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let loan = &loans[self.choose("Return which item?", &label_refs)?];

        let closed = self.library.return_item(loan.item_id, user)?;
        self.save()?;
        info!(item = %loan.item_id, borrower = user, "returned item");

        let returned = format_date(closed.returned_on);
        print(
            &self.ui,
            &receipt(&self.ui, "Returned", &[("Returned", &returned)]),
        );
        Ok(())
    }

    fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()?;
        Ok(value.trim().to_string())
    }
}

/// Items `user` may borrow among `items`: on the shelf, and not their own
/// unless the policy allows self-borrowing.
fn borrow_candidates<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    library: &Library,
    user: &str,
) -> Vec<ItemId> {
    let allow_self = library.policy().allow_self_borrow;
    items
        .into_iter()
        .filter(|item| item.is_available())
        .filter(|item| allow_self || item.contributor != user)
        .map(|item| item.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorware_core::LendingPolicy;

    fn library() -> Library {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "alice-pw").unwrap();
        library.register("bob", "bob-pw").unwrap();
        let dune = NewItem::new(ItemKind::Book, "Dune").with_attribute("author", "Frank Herbert");
        let akira = NewItem::new(ItemKind::Manga, "Akira").with_attribute("author", "Otomo");
        let nature = NewItem::new(ItemKind::Journal, "Nature 7001").with_attribute("journal_name", "Nature");
        library.add_item(&dune, "alice").unwrap();
        library.add_item(&akira, "bob").unwrap();
        library.add_item(&nature, "alice").unwrap();
        library
    }

    #[test]
    fn test_candidates_skip_own_and_borrowed_items() {
        let mut library = library();
        library.borrow(ItemId::new(3), "bob").unwrap();

        let ids = borrow_candidates(library.catalog().iter(), &library, "bob");
        assert_eq!(ids, vec![ItemId::new(1)]);
    }

    #[test]
    fn test_candidates_include_own_items_when_allowed() {
        let mut library = library();
        library.set_policy(LendingPolicy::default().with_self_borrow(true));

        let ids = borrow_candidates(library.catalog().iter(), &library, "bob");
        assert_eq!(ids, vec![ItemId::new(1), ItemId::new(2), ItemId::new(3)]);
    }

    #[test]
    fn test_candidates_follow_search_results() {
        let library = library();
        let filter = SearchFilter::new().kind(ItemKind::Journal);
        let results: Vec<&Item> = library.search(&filter).collect();

        assert_eq!(borrow_candidates(results, &library, "bob"), vec![ItemId::new(3)]);
        assert!(borrow_candidates(library.search(&filter), &library, "alice").is_empty());
    }
}
