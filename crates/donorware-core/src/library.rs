//! Library facade: the catalog, registry and ledger behind one API.
//!
//! Every mutating call checks all of its preconditions before touching any
//! store, so a failed call leaves the library unchanged and an item's status
//! always agrees with the ledger's active-loan set.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::catalog::{Availability, Catalog, Item, ItemId, NewItem};
use crate::error::{DonorError, Result};
use crate::lending::{ClosedLoan, Ledger, LendingPolicy, Loan};
use crate::registry::{Registry, Transaction, User};
use crate::search::{Predicate, Search};

/// Plain snapshot of a library, as loaded from or saved to a store.
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub users: Vec<User>,
    pub items: Vec<Item>,
    pub loans: Vec<Loan>,
    pub closed_loans: Vec<ClosedLoan>,
    pub next_item_id: u64,
}

/// The process-wide inventory: items, users and loans.
#[derive(Debug, Clone, Default)]
pub struct Library {
    catalog: Catalog,
    registry: Registry,
    ledger: Ledger,
    policy: LendingPolicy,
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Library {
    /// Create an empty library.
    pub fn new(policy: LendingPolicy) -> Self {
        Self {
            catalog: Catalog::new(),
            registry: Registry::new(),
            ledger: Ledger::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: LendingPolicy) {
        self.policy = policy;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // --- User registry ---

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::DuplicateUser` if the username exists, or
    /// `DonorError::Validation` for an unusable username or password.
    pub fn register(&mut self, username: &str, password: &str) -> Result<&User> {
        let user = self.registry.register(username, password, Utc::now())?;
        debug!(username, "registered user");
        Ok(user)
    }

    /// Check credentials.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Auth` on any mismatch.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&User> {
        self.registry.authenticate(username, password).map_err(|err| {
            warn!(username, "authentication failed");
            err
        })
    }

    pub fn user(&self, username: &str) -> Result<&User> {
        self.registry.get(username)
    }

    // --- Item catalog ---

    /// Add an item contributed by `contributor`, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotFound` if the contributor is not registered,
    /// or `DonorError::Validation` if the item attributes are invalid.
    pub fn add_item(&mut self, new_item: &NewItem, contributor: &str) -> Result<ItemId> {
        self.add_item_at(new_item, contributor, Utc::now())
    }

    pub fn add_item_at(
        &mut self,
        new_item: &NewItem,
        contributor: &str,
        added_at: DateTime<Utc>,
    ) -> Result<ItemId> {
        self.registry.get(contributor)?;
        let id = self.catalog.insert(new_item, contributor, added_at)?;
        self.registry.get_mut(contributor)?.contributions.insert(id);
        debug!(item_id = %id, kind = %new_item.kind, contributor, "added item");
        Ok(id)
    }

    /// Get an item by id.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotFound` if no item has this id.
    pub fn get_item(&self, id: ItemId) -> Result<&Item> {
        self.catalog.get(id)
    }

    /// Items contributed by a user, in insertion order.
    pub fn contributed_by(&self, username: &str) -> Result<Vec<&Item>> {
        self.registry.get(username)?;
        Ok(self.catalog.contributed_by(username).collect())
    }

    // --- Search ---

    /// Lazily filter the catalog. Results keep insertion order.
    pub fn search<'a, P: Predicate + ?Sized>(&'a self, predicate: &'a P) -> Search<'a, P> {
        Search::new(self.catalog.items(), predicate)
    }

    // --- Lending ledger ---

    /// Borrow an item today.
    pub fn borrow(&mut self, item_id: ItemId, borrower: &str) -> Result<Loan> {
        self.borrow_on(item_id, borrower, today())
    }

    /// Borrow an item on a given date.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotFound` for an unknown item or borrower, and
    /// `DonorError::Unavailable` if the item is already borrowed or the
    /// policy forbids borrowing one's own contribution.
    pub fn borrow_on(&mut self, item_id: ItemId, borrower: &str, on: NaiveDate) -> Result<Loan> {
        self.registry.get(borrower)?;
        let item = self.catalog.get(item_id)?;
        if item.status != Availability::Available {
            warn!(item_id = %item_id, borrower, "borrow rejected: item on loan");
            return Err(DonorError::Unavailable(format!(
                "\"{}\" (item {}) is already borrowed",
                item.title, item_id
            )));
        }
        if !self.policy.allow_self_borrow && item.contributor == borrower {
            warn!(item_id = %item_id, borrower, "borrow rejected: self-borrow");
            return Err(DonorError::Unavailable(format!(
                "\"{}\" (item {}) was contributed by you",
                item.title, item_id
            )));
        }
        let due_on = self.policy.due_date(on)?;

        let loan = self
            .ledger
            .open(Loan {
                item_id,
                borrower: borrower.to_string(),
                borrowed_on: on,
                due_on,
            })?
            .clone();
        self.catalog.get_mut(item_id)?.status = Availability::Borrowed;
        self.registry
            .get_mut(borrower)?
            .history
            .push(Transaction::borrow(item_id, on, due_on));
        debug!(item_id = %item_id, borrower, due_on = %due_on, "opened loan");
        Ok(loan)
    }

    /// Return an item today.
    pub fn return_item(&mut self, item_id: ItemId, borrower: &str) -> Result<ClosedLoan> {
        self.return_item_on(item_id, borrower, today())
    }

    /// Return an item on a given date.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotFound` for an unknown item,
    /// `DonorError::NotBorrowed` if `borrower` holds no active loan for it and
    /// `DonorError::Validation` if `on` is before the loan started.
    pub fn return_item_on(
        &mut self,
        item_id: ItemId,
        borrower: &str,
        on: NaiveDate,
    ) -> Result<ClosedLoan> {
        self.catalog.get(item_id)?;
        let closed = self.ledger.close(item_id, borrower, on)?;
        self.catalog.get_mut(item_id)?.status = Availability::Available;
        self.registry
            .get_mut(borrower)?
            .history
            .push(Transaction::returned(item_id, on));
        debug!(item_id = %item_id, borrower, "closed loan");
        Ok(closed)
    }

    /// Active loans due before `as_of`. Read-only.
    pub fn overdue(&self, as_of: NaiveDate) -> impl Iterator<Item = &Loan> {
        self.ledger.overdue(as_of)
    }

    /// A user's active loans, shortest loans first.
    pub fn active_loans_for(&self, username: &str) -> Result<Vec<&Loan>> {
        self.registry.get(username)?;
        Ok(self.ledger.loans_for(username))
    }

    /// A user's borrow/return events, oldest first.
    pub fn history_for(&self, username: &str) -> Result<&[Transaction]> {
        Ok(&self.registry.get(username)?.history)
    }

    // --- Snapshots ---

    /// Rebuild a library from a snapshot and verify its invariants.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Integrity` if the snapshot is inconsistent.
    pub fn from_state(state: LibraryState, policy: LendingPolicy) -> Result<Self> {
        let mut registry = Registry::from_users(state.users)?;
        for item in &state.items {
            registry
                .get_mut(&item.contributor)
                .map_err(|_| {
                    DonorError::Integrity(format!(
                        "item {} contributed by unknown user {}",
                        item.id, item.contributor
                    ))
                })?
                .contributions
                .insert(item.id);
        }
        let ledger = Ledger::from_parts(state.loans, state.closed_loans)
            .map_err(|e| DonorError::Integrity(e.to_string()))?;
        let library = Self {
            catalog: Catalog::from_parts(state.items, state.next_item_id),
            registry,
            ledger,
            policy,
        };
        library.check_integrity()?;
        Ok(library)
    }

    /// Snapshot the library for persistence.
    pub fn to_state(&self) -> LibraryState {
        LibraryState {
            users: self.registry.iter().cloned().collect(),
            items: self.catalog.items().to_vec(),
            loans: self.ledger.active_loans().cloned().collect(),
            closed_loans: self.ledger.closed_loans().to_vec(),
            next_item_id: self.catalog.next_id(),
        }
    }

    /// Verify library invariants.
    ///
    /// Checks:
    /// - item ids are unique and below the next id
    /// - every item is Borrowed exactly when it has an active loan
    /// - every loan references a known item and a known borrower
    /// - no closed loan was returned before it started
    /// - every contributor is registered and contribution sets match
    /// - every history entry references a known item
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Integrity` describing the first violation found.
    pub fn check_integrity(&self) -> Result<()> {
        let integrity = |message: String| Err(DonorError::Integrity(message));

        let mut previous: Option<ItemId> = None;
        for item in self.catalog.iter() {
            if previous.is_some_and(|p| p >= item.id) {
                return integrity(format!("duplicate item id {}", item.id));
            }
            previous = Some(item.id);
            if item.id.get() == 0 || item.id.get() >= self.catalog.next_id() {
                return integrity(format!(
                    "item id {} outside allocated range (next id {})",
                    item.id,
                    self.catalog.next_id()
                ));
            }
            let on_loan = self.ledger.is_on_loan(item.id);
            match (item.status, on_loan) {
                (Availability::Borrowed, false) => {
                    return integrity(format!("item {} is borrowed without a loan", item.id))
                }
                (Availability::Available, true) => {
                    return integrity(format!("item {} is available but on loan", item.id))
                }
                _ => {}
            }
            let contributor = match self.registry.get(&item.contributor) {
                Ok(user) => user,
                Err(_) => {
                    return integrity(format!(
                        "item {} contributed by unknown user {}",
                        item.id, item.contributor
                    ))
                }
            };
            if !contributor.contributions.contains(&item.id) {
                return integrity(format!(
                    "item {} missing from {}'s contributions",
                    item.id, item.contributor
                ));
            }
        }

        for loan in self.ledger.active_loans() {
            if self.catalog.get(loan.item_id).is_err() {
                return integrity(format!("loan for unknown item {}", loan.item_id));
            }
            if !self.registry.contains(&loan.borrower) {
                return integrity(format!(
                    "loan for item {} held by unknown user {}",
                    loan.item_id, loan.borrower
                ));
            }
            if loan.due_on < loan.borrowed_on {
                return integrity(format!("loan for item {} is due before it started", loan.item_id));
            }
        }

        for closed in self.ledger.closed_loans() {
            if closed.returned_on < closed.loan.borrowed_on {
                return integrity(format!(
                    "loan for item {} was returned before it started",
                    closed.loan.item_id
                ));
            }
        }

        for user in self.registry.iter() {
            for id in &user.contributions {
                match self.catalog.get(*id) {
                    Ok(item) if item.contributor == user.username => {}
                    _ => {
                        return integrity(format!(
                            "{} lists item {} as a contribution",
                            user.username, id
                        ))
                    }
                }
            }
            for transaction in &user.history {
                if self.catalog.get(transaction.item_id).is_err() {
                    return integrity(format!(
                        "{}'s history references unknown item {}",
                        user.username, transaction.item_id
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemKind;
    use crate::registry::TransactionKind;
    use crate::search::SearchFilter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dune() -> NewItem {
        NewItem::new(ItemKind::Book, "Dune").with_attribute("author", "Frank Herbert")
    }

    fn library_with_dune() -> (Library, ItemId) {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "alice-pw").unwrap();
        library.register("bob", "bob-pw").unwrap();
        let id = library.add_item(&dune(), "alice").unwrap();
        (library, id)
    }

    fn assert_consistent(library: &Library) {
        for item in library.catalog().iter() {
            assert_eq!(
                item.status == Availability::Borrowed,
                library.ledger().active(item.id).is_some(),
                "item {} status disagrees with ledger",
                item.id
            );
        }
        library.check_integrity().unwrap();
    }

    #[test]
    fn test_add_item_records_contribution() {
        let (library, id) = library_with_dune();
        assert_eq!(library.catalog().len(), 1);
        assert!(library.user("alice").unwrap().contributions.contains(&id));
        assert_eq!(library.get_item(id).unwrap().status, Availability::Available);
    }

    #[test]
    fn test_add_item_for_unknown_contributor_fails() {
        let mut library = Library::new(LendingPolicy::default());
        let err = library.add_item(&dune(), "ghost").unwrap_err();
        assert!(matches!(err, DonorError::NotFound(_)));
        assert!(library.catalog().is_empty());
    }

    #[test]
    fn test_add_item_missing_required_attribute() {
        let mut library = Library::new(LendingPolicy::default());
        library.register("alice", "pw").unwrap();
        let err = library
            .add_item(&NewItem::new(ItemKind::Book, "Dune"), "alice")
            .unwrap_err();
        assert!(matches!(err, DonorError::Validation(_)));
        assert!(library.user("alice").unwrap().contributions.is_empty());
    }

    #[test]
    fn test_borrow_and_return_round_trip() {
        let (mut library, id) = library_with_dune();

        let loan = library.borrow_on(id, "bob", date(2024, 3, 1)).unwrap();
        assert_eq!(loan.due_on, date(2024, 3, 15));
        assert_eq!(library.get_item(id).unwrap().status, Availability::Borrowed);
        assert_consistent(&library);

        let closed = library.return_item_on(id, "bob", date(2024, 3, 10)).unwrap();
        assert_eq!(closed.loan, loan);
        assert_eq!(library.get_item(id).unwrap().status, Availability::Available);
        assert!(library.ledger().active(id).is_none());
        assert_consistent(&library);

        let history = library.history_for("bob").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, TransactionKind::Borrow);
        assert_eq!(history[1].kind, TransactionKind::Return);
    }

    #[test]
    fn test_borrow_borrowed_item_is_unavailable() {
        let (mut library, id) = library_with_dune();
        library.register("carol", "carol-pw").unwrap();
        library.borrow_on(id, "bob", date(2024, 3, 1)).unwrap();

        let err = library.borrow_on(id, "carol", date(2024, 3, 2)).unwrap_err();
        assert!(matches!(err, DonorError::Unavailable(_)));
        assert!(library.history_for("carol").unwrap().is_empty());
        assert_consistent(&library);
    }

    #[test]
    fn test_self_borrow_follows_policy() {
        let (mut library, id) = library_with_dune();
        let err = library.borrow_on(id, "alice", date(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, DonorError::Unavailable(_)));

        library.set_policy(LendingPolicy::default().with_self_borrow(true));
        library.borrow_on(id, "alice", date(2024, 3, 1)).unwrap();
        assert_consistent(&library);
    }

    #[test]
    fn test_return_without_loan_is_not_borrowed() {
        let (mut library, id) = library_with_dune();
        let err = library.return_item_on(id, "bob", date(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, DonorError::NotBorrowed(_)));
        assert!(library.history_for("bob").unwrap().is_empty());
    }

    #[test]
    fn test_return_by_someone_else_is_not_borrowed() {
        let (mut library, id) = library_with_dune();
        library.register("carol", "carol-pw").unwrap();
        library.borrow_on(id, "bob", date(2024, 3, 1)).unwrap();
        let err = library.return_item_on(id, "carol", date(2024, 3, 2)).unwrap_err();
        assert!(matches!(err, DonorError::NotBorrowed(_)));
        assert_eq!(library.get_item(id).unwrap().status, Availability::Borrowed);
    }

    #[test]
    fn test_borrow_unknown_item_or_user_is_not_found() {
        let (mut library, id) = library_with_dune();
        assert!(matches!(
            library.borrow_on(ItemId::new(99), "bob", date(2024, 3, 1)),
            Err(DonorError::NotFound(_))
        ));
        assert!(matches!(
            library.borrow_on(id, "ghost", date(2024, 3, 1)),
            Err(DonorError::NotFound(_))
        ));
    }

    #[test]
    fn test_overdue_is_read_only() {
        let (mut library, id) = library_with_dune();
        library.borrow_on(id, "bob", date(2024, 3, 1)).unwrap();

        assert_eq!(library.overdue(date(2024, 3, 15)).count(), 0);
        let overdue: Vec<_> = library.overdue(date(2024, 3, 16)).collect();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].borrower, "bob");
        assert_eq!(library.ledger().len(), 1);
    }

    #[test]
    fn test_search_through_library() {
        let (mut library, _) = library_with_dune();
        library
            .add_item(
                &NewItem::new(ItemKind::Magazine, "Wired").with_attribute("publisher", "Conde Nast"),
                "bob",
            )
            .unwrap();

        let filter = SearchFilter::new().kind(ItemKind::Magazine);
        let titles: Vec<&str> = library.search(&filter).map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Wired"]);
        assert_eq!(library.search(&SearchFilter::new()).count(), 2);
    }

    #[test]
    fn test_state_round_trip() {
        let (mut library, id) = library_with_dune();
        library.borrow_on(id, "bob", date(2024, 3, 1)).unwrap();

        let restored =
            Library::from_state(library.to_state(), LendingPolicy::default()).unwrap();
        assert_eq!(restored.catalog().len(), 1);
        assert_eq!(restored.ledger().active(id).unwrap().borrower, "bob");
        assert!(restored.user("alice").unwrap().contributions.contains(&id));
        assert_eq!(restored.catalog().next_id(), 2);
    }

    #[test]
    fn test_from_state_detects_status_mismatch() {
        let (library, id) = library_with_dune();
        let mut state = library.to_state();
        state.items[0].status = Availability::Borrowed;
        let err = Library::from_state(state, LendingPolicy::default()).unwrap_err();
        assert!(matches!(err, DonorError::Integrity(_)));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_from_state_detects_orphan_loan() {
        let (library, _) = library_with_dune();
        let mut state = library.to_state();
        state.loans.push(Loan {
            item_id: ItemId::new(7),
            borrower: "bob".to_string(),
            borrowed_on: date(2024, 3, 1),
            due_on: date(2024, 3, 15),
        });
        assert!(matches!(
            Library::from_state(state, LendingPolicy::default()),
            Err(DonorError::Integrity(_))
        ));
    }

    #[test]
    fn test_return_before_borrow_date_leaves_loan_open() {
        let (mut library, id) = library_with_dune();
        library.borrow_on(id, "bob", date(2024, 3, 10)).unwrap();

        let err = library.return_item_on(id, "bob", date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, DonorError::Validation(_)));
        assert_eq!(library.get_item(id).unwrap().status, Availability::Borrowed);
        assert_eq!(library.history_for("bob").unwrap().len(), 1);
        assert_consistent(&library);
    }

    #[test]
    fn test_from_state_detects_return_before_borrow() {
        let (mut library, id) = library_with_dune();
        library.borrow_on(id, "bob", date(2024, 3, 10)).unwrap();
        library.return_item_on(id, "bob", date(2024, 3, 12)).unwrap();

        let mut state = library.to_state();
        state.closed_loans[0].returned_on = date(2024, 1, 1);
        let err = Library::from_state(state, LendingPolicy::default()).unwrap_err();
        assert!(matches!(err, DonorError::Integrity(_)));
        assert!(err.to_string().contains("returned before it started"));
    }

    #[test]
    fn test_contributed_by_outlives_username() {
        let (library, id) = library_with_dune();
        let items = {
            let username = String::from("alice");
            library.contributed_by(&username).unwrap()
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
    }
}
