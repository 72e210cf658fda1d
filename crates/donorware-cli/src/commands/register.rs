use tracing::info;

use crate::app::AppContext;
use crate::cli::RegisterArgs;
use crate::helpers::{prompt_new_password, prompt_username};
use crate::ui::{print, receipt};

pub fn handle_register(ctx: &AppContext, args: &RegisterArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut library = ctx.load_library()?;

    let given = args.username.as_deref().or(ctx.cli().user.as_deref());
    let username = prompt_username(given, ctx.interactive())?;
    let password = prompt_new_password(ctx.interactive())?;

    library.register(&username, &password)?;
    ctx.save_library(&library)?;
    info!(user = %username, "registered user");

    if ctx.cli().json {
        println!("{}", serde_json::json!({ "username": username }));
    } else if !ctx.quiet() {
        print(&ui, &receipt(&ui, "Registered", &[("User", &username)]));
    }
    Ok(())
}
