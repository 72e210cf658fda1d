use tracing::info;

use donorware_core::library::today;
use donorware_core::Loan;

use crate::app::{login, AppContext};
use crate::cli::{ItemArgs, OverdueArgs};
use crate::helpers::{parse_date, parse_item_id};
use crate::output::{loan_json, overdue_table};
use crate::ui::{format_date, print, receipt};

pub fn handle_borrow(ctx: &AppContext, args: &ItemArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let id = parse_item_id(&args.id)?;
    let mut library = ctx.load_library()?;
    let user = login(&library, ctx.cli().user.as_deref(), ctx.interactive())?;

    let loan = library.borrow(id, &user)?;
    ctx.save_library(&library)?;
    info!(item = %id, borrower = %user, due = %loan.due_on, "borrowed item");

    let title = library.get_item(id)?.title.as_str();
    if ctx.cli().json {
        println!("{}", serde_json::to_string_pretty(&loan_json(&loan, Some(title), None))?);
    } else if !ctx.quiet() {
        let due = format_date(loan.due_on);
        print(
            &ui,
            &receipt(&ui, "Borrowed", &[("Title", title), ("Due", &due)]),
        );
    }
    Ok(())
}

pub fn handle_return(ctx: &AppContext, args: &ItemArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let id = parse_item_id(&args.id)?;
    let mut library = ctx.load_library()?;
    let user = login(&library, ctx.cli().user.as_deref(), ctx.interactive())?;

    let closed = library.return_item(id, &user)?;
    ctx.save_library(&library)?;
    info!(item = %id, borrower = %user, "returned item");

    let title = library.get_item(id)?.title.as_str();
    let late_days = closed.loan.days_overdue(closed.returned_on).max(0);
    if ctx.cli().json {
        let value = serde_json::json!({
            "item_id": id.get(),
            "title": title,
            "borrower": closed.loan.borrower,
            "borrowed_on": closed.loan.borrowed_on,
            "due_on": closed.loan.due_on,
            "returned_on": closed.returned_on,
            "days_late": late_days,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if !ctx.quiet() {
        let returned = format_date(closed.returned_on);
        let late = format!("{} days", late_days);
        let mut fields = vec![("Title", title), ("Returned", returned.as_str())];
        if late_days > 0 {
            fields.push(("Late", late.as_str()));
        }
        print(&ui, &receipt(&ui, "Returned", &fields));
    }
    Ok(())
}

pub fn handle_overdue(ctx: &AppContext, args: &OverdueArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let as_of = match args.as_of.as_deref() {
        Some(value) => parse_date(value)?,
        None => today(),
    };
    let library = ctx.load_library()?;
    let loans: Vec<&Loan> = library.overdue(as_of).collect();
    let title_of = |loan: &Loan| library.get_item(loan.item_id).ok().map(|i| i.title.as_str());

    if ctx.cli().json {
        let values: Vec<_> = loans
            .iter()
            .map(|&loan| loan_json(loan, title_of(loan), Some(as_of)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }
    if loans.is_empty() {
        if !ctx.quiet() {
            print(&ui, &format!("No overdue loans as of {}.", format_date(as_of)));
        }
        return Ok(());
    }
    print(&ui, &overdue_table(&ui, &loans, as_of, title_of));
    Ok(())
}
