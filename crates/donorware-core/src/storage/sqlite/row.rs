//! Row types for database queries.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::catalog::{Availability, Item, ItemDetails, ItemId, ItemKind, DATE_FORMAT};
use crate::error::{DonorError, Result};
use crate::lending::{ClosedLoan, Loan};
use crate::registry::{Transaction, TransactionKind, User};

fn parse_item_id(value: i64) -> Result<ItemId> {
    u64::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .map(ItemId::new)
        .ok_or_else(|| DonorError::Storage(format!("Invalid item id: {}", value)))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DonorError::Storage(format!("Invalid date {:?}: {}", value, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| DonorError::Storage(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc))
}

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Raw row from the users table.
#[derive(Debug)]
pub struct UserRow {
    pub username: String,
    pub password_hash: String,
    pub registered_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DonorError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            username: row.username,
            password_hash: row.password_hash,
            contributions: BTreeSet::new(),
            history: Vec::new(),
            registered_at: parse_timestamp(&row.registered_at)?,
        })
    }
}

/// Raw row from the items table.
#[derive(Debug)]
pub struct ItemRow {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub contributor: String,
    pub details_json: String,
    pub status: String,
    pub added_at: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = DonorError;

    fn try_from(row: ItemRow) -> Result<Self> {
        let id = parse_item_id(row.id)?;
        let kind: ItemKind = row
            .kind
            .parse()
            .map_err(|_| DonorError::Storage(format!("Invalid item kind: {}", row.kind)))?;
        let details: ItemDetails = serde_json::from_str(&row.details_json)
            .map_err(|e| DonorError::Storage(format!("Invalid details JSON: {}", e)))?;
        if details.kind() != kind {
            return Err(DonorError::Storage(format!(
                "Item {} details are {} but row says {}",
                id,
                details.kind(),
                kind
            )));
        }
        let status: Availability = row
            .status
            .parse()
            .map_err(|_| DonorError::Storage(format!("Invalid item status: {}", row.status)))?;

        Ok(Item {
            id,
            title: row.title,
            contributor: row.contributor,
            details,
            status,
            added_at: parse_timestamp(&row.added_at)?,
        })
    }
}

/// Raw row from the loans table.
#[derive(Debug)]
pub struct LoanRow {
    pub item_id: i64,
    pub borrower: String,
    pub borrowed_on: String,
    pub due_on: String,
}

impl TryFrom<LoanRow> for Loan {
    type Error = DonorError;

    fn try_from(row: LoanRow) -> Result<Self> {
        Ok(Loan {
            item_id: parse_item_id(row.item_id)?,
            borrower: row.borrower,
            borrowed_on: parse_date(&row.borrowed_on)?,
            due_on: parse_date(&row.due_on)?,
        })
    }
}

/// Raw row from the loan_history table.
#[derive(Debug)]
pub struct ClosedLoanRow {
    pub loan: LoanRow,
    pub returned_on: String,
}

impl TryFrom<ClosedLoanRow> for ClosedLoan {
    type Error = DonorError;

    fn try_from(row: ClosedLoanRow) -> Result<Self> {
        Ok(ClosedLoan {
            loan: Loan::try_from(row.loan)?,
            returned_on: parse_date(&row.returned_on)?,
        })
    }
}

/// Raw row from the transactions table.
#[derive(Debug)]
pub struct TransactionRow {
    pub id: String,
    pub username: String,
    pub item_id: i64,
    pub kind: String,
    pub date: String,
    pub due_date: Option<String>,
}

impl TransactionRow {
    /// Parse the row into the owning username and the transaction.
    pub fn into_parts(self) -> Result<(String, Transaction)> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DonorError::Storage(format!("Invalid transaction UUID: {}", e)))?;
        let kind: TransactionKind = self.kind.parse()?;
        let due_date = self.due_date.as_deref().map(parse_date).transpose()?;

        let transaction = Transaction {
            id,
            item_id: parse_item_id(self.item_id)?,
            kind,
            date: parse_date(&self.date)?,
            due_date,
        };
        Ok((self.username, transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_row_kind_mismatch_is_rejected() {
        let row = ItemRow {
            id: 1,
            kind: "magazine".to_string(),
            title: "Dune".to_string(),
            contributor: "alice".to_string(),
            details_json: r#"{"kind":"book","author":"Frank Herbert"}"#.to_string(),
            status: "available".to_string(),
            added_at: "2024-03-01T10:00:00Z".to_string(),
        };
        assert!(matches!(Item::try_from(row), Err(DonorError::Storage(_))));
    }

    #[test]
    fn test_zero_item_id_is_rejected() {
        let row = LoanRow {
            item_id: 0,
            borrower: "bob".to_string(),
            borrowed_on: "2024-03-01".to_string(),
            due_on: "2024-03-15".to_string(),
        };
        assert!(Loan::try_from(row).is_err());
    }
}
