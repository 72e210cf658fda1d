use donorware_core::DonorError;

use crate::app::AppContext;

/// Report store integrity. Loading the library already verifies every
/// invariant, so a successful load is a passing check.
pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let library = match ctx.load_library() {
        Ok(library) => library,
        Err(err) if is_integrity_error(&err) => {
            eprintln!("Integrity check: FAILED");
            eprintln!("- error: {}", err);
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    if ctx.cli().json {
        let value = serde_json::json!({
            "status": "ok",
            "users": library.registry().len(),
            "items": library.catalog().len(),
            "active_loans": library.ledger().len(),
            "closed_loans": library.ledger().closed_loans().len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if !ctx.quiet() {
        println!("Integrity check: OK");
        println!("- users: {}", library.registry().len());
        println!("- items: {}", library.catalog().len());
        println!("- active loans: {}", library.ledger().len());
        println!("- closed loans: {}", library.ledger().closed_loans().len());
    }
    Ok(())
}

fn is_integrity_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<DonorError>(), Some(DonorError::Integrity(_))))
}
