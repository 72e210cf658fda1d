//! Lending ledger: active loans, closed loans and the lending policy.
//!
//! The ledger only records loans. Keeping item status and user history in
//! step with it is the job of [`crate::library::Library`].

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemId;
use crate::error::{DonorError, Result};

/// Default loan length in days.
pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 14;

/// Rules applied when an item is borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingPolicy {
    /// Days between borrow date and due date
    pub loan_period_days: u32,

    /// Whether a contributor may borrow their own item
    pub allow_self_borrow: bool,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            allow_self_borrow: false,
        }
    }
}

impl LendingPolicy {
    pub fn with_loan_period_days(mut self, days: u32) -> Self {
        self.loan_period_days = days;
        self
    }

    pub fn with_self_borrow(mut self, allow: bool) -> Self {
        self.allow_self_borrow = allow;
        self
    }

    /// Due date for a loan starting on `start`.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Validation` if the loan period is zero or the
    /// due date overflows the calendar.
    pub fn due_date(&self, start: NaiveDate) -> Result<NaiveDate> {
        if self.loan_period_days == 0 {
            return Err(DonorError::Validation(
                "Loan period must be at least one day".to_string(),
            ));
        }
        start
            .checked_add_days(Days::new(u64::from(self.loan_period_days)))
            .ok_or_else(|| DonorError::Validation("Due date out of range".to_string()))
    }
}

/// An active borrow relation between a user and an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub item_id: ItemId,
    pub borrower: String,
    pub borrowed_on: NaiveDate,
    pub due_on: NaiveDate,
}

impl Loan {
    /// True once `as_of` is past the due date.
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.due_on < as_of
    }

    /// Whole days past due as of `as_of` (zero when not overdue).
    pub fn days_overdue(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.due_on).num_days().max(0)
    }

    /// Loan length in days.
    pub fn length_days(&self) -> i64 {
        (self.due_on - self.borrowed_on).num_days()
    }
}

/// A loan that has been returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedLoan {
    #[serde(flatten)]
    pub loan: Loan,
    pub returned_on: NaiveDate,
}

/// Authoritative record of active and historical loans.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    active: BTreeMap<ItemId, Loan>,
    closed: Vec<ClosedLoan>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(loans: Vec<Loan>, closed: Vec<ClosedLoan>) -> Result<Self> {
        let mut ledger = Self {
            active: BTreeMap::new(),
            closed,
        };
        for loan in loans {
            ledger.open(loan)?;
        }
        Ok(ledger)
    }

    /// Record a new active loan.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Unavailable` if the item already has an active loan.
    pub(crate) fn open(&mut self, loan: Loan) -> Result<&Loan> {
        if self.active.contains_key(&loan.item_id) {
            return Err(DonorError::Unavailable(format!(
                "item {} is already on loan",
                loan.item_id
            )));
        }
        let item_id = loan.item_id;
        Ok(&*self.active.entry(item_id).or_insert(loan))
    }

    /// Close the active loan of `item_id` held by `borrower`.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::NotBorrowed` if the item is not on loan, or is
    /// on loan to somebody else, and `DonorError::Validation` if
    /// `returned_on` is before the loan started.
    pub(crate) fn close(
        &mut self,
        item_id: ItemId,
        borrower: &str,
        returned_on: NaiveDate,
    ) -> Result<ClosedLoan> {
        match self.active.get(&item_id) {
            Some(loan) if loan.borrower == borrower => {
                if returned_on < loan.borrowed_on {
                    return Err(DonorError::Validation(format!(
                        "return date {} is before the loan started on {}",
                        returned_on, loan.borrowed_on
                    )));
                }
            }
            _ => {
                return Err(DonorError::NotBorrowed(format!(
                    "{} has no active loan for item {}",
                    borrower, item_id
                )))
            }
        }
        let loan = self
            .active
            .remove(&item_id)
            .ok_or_else(|| DonorError::NotBorrowed(format!("item {}", item_id)))?;
        let closed = ClosedLoan { loan, returned_on };
        self.closed.push(closed.clone());
        Ok(closed)
    }

    /// Active loan for an item, if any.
    pub fn active(&self, item_id: ItemId) -> Option<&Loan> {
        self.active.get(&item_id)
    }

    pub fn is_on_loan(&self, item_id: ItemId) -> bool {
        self.active.contains_key(&item_id)
    }

    /// All active loans, in item id order.
    pub fn active_loans(&self) -> impl Iterator<Item = &Loan> {
        self.active.values()
    }

    pub fn closed_loans(&self) -> &[ClosedLoan] {
        &self.closed
    }

    /// Active loans whose due date is before `as_of`.
    pub fn overdue(&self, as_of: NaiveDate) -> impl Iterator<Item = &Loan> {
        self.active
            .values()
            .filter(move |loan| loan.is_overdue(as_of))
    }

    /// Active loans held by `borrower`, shortest loans first, then by due date.
    pub fn loans_for(&self, borrower: &str) -> Vec<&Loan> {
        let mut loans: Vec<&Loan> = self
            .active
            .values()
            .filter(|loan| loan.borrower == borrower)
            .collect();
        loans.sort_by_key(|loan| (loan.length_days(), loan.due_on, loan.item_id));
        loans
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
