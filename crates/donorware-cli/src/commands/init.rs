use std::path::PathBuf;

use tracing::info;

use donorware_core::{SqliteStore, StateStore};

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{read_config, write_config, DonorConfig, LendingSection};
use crate::errors::CliError;
use crate::ui::{blank_line, header, hint, print, receipt};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let target = match args.path.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(path) => PathBuf::from(path),
        None => ctx.store_path()?,
    };

    let store = SqliteStore::new(&target);
    if store.exists() {
        return Err(CliError::invalid_input(format!(
            "A DonorWare store already exists at {}",
            target.display()
        ))
        .into());
    }

    let config_path = resolve_config_path()?;
    let mut config = if config_path.exists() {
        read_config(&config_path)?
    } else {
        DonorConfig::default()
    };
    let lending = LendingSection {
        loan_period_days: args
            .loan_period_days
            .unwrap_or(config.lending.loan_period_days),
        allow_self_borrow: args.allow_self_borrow || config.lending.allow_self_borrow,
    };
    config = DonorConfig {
        ui: config.ui,
        ..DonorConfig::new(&target, lending)
    };
    if config.lending.loan_period_days == 0 {
        return Err(CliError::invalid_input("Loan period must be at least one day").into());
    }

    store.create()?;
    write_config(&config_path, &config)?;
    info!(store = %target.display(), config = %config_path.display(), "initialized store");

    if ctx.cli().json {
        let value = serde_json::json!({
            "store": target,
            "config": config_path,
            "loan_period_days": config.lending.loan_period_days,
            "allow_self_borrow": config.lending.allow_self_borrow,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if ctx.quiet() {
        return Ok(());
    }

    let store_display = target.display().to_string();
    let config_display = config_path.display().to_string();
    let period = format!("{} days", config.lending.loan_period_days);
    print(&ui, &header(&ui, "init", None));
    blank_line(&ui);
    print(
        &ui,
        &receipt(
            &ui,
            "Store created",
            &[
                ("Store", &store_display),
                ("Config", &config_display),
                ("Loan period", &period),
            ],
        ),
    );
    blank_line(&ui);
    print(&ui, &hint(&ui, "Run `donorware register` to create the first account."));
    Ok(())
}
