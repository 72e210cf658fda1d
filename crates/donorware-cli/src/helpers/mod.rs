//! Input and parsing helper functions for the CLI.
//!
//! - Username and password prompting (`input`)
//! - Item IDs, item types, `key=value` fields and dates (`parsing`)

mod input;
mod parsing;

pub use input::{prompt_new_password, prompt_password, prompt_username};
pub use parsing::{parse_date, parse_fields, parse_item_id, parse_kind};
