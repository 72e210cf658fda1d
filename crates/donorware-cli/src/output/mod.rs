//! Output formatting for items, loans and history.
//!
//! JSON values for `--json`, and tables or detail blocks otherwise.

mod json;
mod text;

pub use json::{item_json, items_json, loan_json, transaction_json};
pub use text::{item_detail, item_table, loan_table, overdue_table, transaction_table};
