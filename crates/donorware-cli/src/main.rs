//! DonorWare CLI - a community inventory of donated literature
//!
//! This is the command-line interface for DonorWare. It provides an
//! interactive menu and scriptable subcommands over the core library.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{init, inventory, items, lending, maintenance, menu, misc, register};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::ui::print_error;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(err) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context();
        let hint = errors::hint(&err);
        print_error(&ui_ctx, &format!("{:#}", err), hint.as_deref());
        std::process::exit(errors::exit_code(&err));
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args),
        Some(Commands::Register(args)) => register::handle_register(ctx, args),
        Some(Commands::Add(args)) => items::handle_add(ctx, args),
        Some(Commands::Show(args)) => items::handle_show(ctx, args),
        Some(Commands::Search(args)) => items::handle_search(ctx, args),
        Some(Commands::Borrow(args)) => lending::handle_borrow(ctx, args),
        Some(Commands::Return(args)) => lending::handle_return(ctx, args),
        Some(Commands::Inventory(args)) => inventory::handle_inventory(ctx, args),
        Some(Commands::Overdue(args)) => lending::handle_overdue(ctx, args),
        Some(Commands::Check) => maintenance::handle_check(ctx),
        Some(Commands::Completions(args)) => misc::handle_completions(args),
        Some(Commands::Menu) | None => menu::handle_menu(ctx),
    }
}
