use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use donorware_core::VERSION;

/// DonorWare - a community inventory of donated books, magazines, journals,
/// manga, comics and research papers
#[derive(Parser)]
#[command(name = "donorware")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store file
    #[arg(short, long, global = true, env = "DONORWARE_STORE")]
    pub store: Option<String>,

    /// Username for commands that act on behalf of a user
    #[arg(short, long, global = true, env = "DONORWARE_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols and table borders only
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the store will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Loan length in days written to the config
    #[arg(long, value_name = "DAYS")]
    pub loan_period_days: Option<u32>,

    /// Let contributors borrow their own items
    #[arg(long)]
    pub allow_self_borrow: bool,
}

/// Arguments for the `register` command
#[derive(Args)]
pub struct RegisterArgs {
    /// Username to register (defaults to --user)
    #[arg(value_name = "USERNAME")]
    pub username: Option<String>,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Item type (book, magazine, journal, manga, western_comic, research_paper)
    #[arg(value_name = "TYPE")]
    pub kind: String,

    /// Item title
    #[arg(long)]
    pub title: String,

    /// Type-specific attribute, e.g. --field author="Frank Herbert"
    #[arg(short, long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

/// Arguments for commands that take a single item ID
#[derive(Args)]
pub struct ItemArgs {
    /// Item ID
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for the `search` command
#[derive(Args)]
pub struct SearchArgs {
    /// Text matched against title, contributor and attributes
    #[arg(value_name = "TERM")]
    pub term: Option<String>,

    /// Filter by item type
    #[arg(long)]
    pub r#type: Option<String>,

    /// Filter by title substring
    #[arg(long)]
    pub title: Option<String>,

    /// Filter by contributor username
    #[arg(long)]
    pub contributor: Option<String>,

    /// Only items on the shelf
    #[arg(long, conflicts_with = "borrowed")]
    pub available: bool,

    /// Only items currently on loan
    #[arg(long)]
    pub borrowed: bool,
}

/// Personal inventory sections
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InventoryView {
    /// Items you contributed
    Contributed,
    /// Your borrow and return history
    History,
    /// Items you currently have on loan
    Borrowed,
}

/// Arguments for the `inventory` command
#[derive(Args)]
pub struct InventoryArgs {
    /// Section to show (all sections when omitted)
    #[arg(value_enum, value_name = "VIEW")]
    pub view: Option<InventoryView>,
}

/// Arguments for the `overdue` command
#[derive(Args)]
pub struct OverdueArgs {
    /// Reference date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<String>,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new, empty store and write the config file
    Init(InitArgs),

    /// Register a new user
    Register(RegisterArgs),

    /// Contribute an item to the catalog
    Add(AddArgs),

    /// Show a single item
    Show(ItemArgs),

    /// Search the catalog
    Search(SearchArgs),

    /// Borrow an item
    Borrow(ItemArgs),

    /// Return a borrowed item
    Return(ItemArgs),

    /// Show your contributions, history and current loans
    Inventory(InventoryArgs),

    /// List overdue loans
    Overdue(OverdueArgs),

    /// Check store integrity
    Check,

    /// Run the interactive menu (default)
    Menu,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
