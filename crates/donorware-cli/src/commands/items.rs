use tracing::info;

use donorware_core::{Availability, NewItem, SearchFilter};

use crate::app::{login, AppContext};
use crate::cli::{AddArgs, ItemArgs, SearchArgs};
use crate::helpers::{parse_fields, parse_item_id, parse_kind};
use crate::output::{item_detail, item_json, item_table, items_json};
use crate::ui::{hint, print, receipt};

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let kind = parse_kind(&args.kind)?;
    let attributes = parse_fields(&args.fields)?;

    let mut library = ctx.load_library()?;
    let user = login(&library, ctx.cli().user.as_deref(), ctx.interactive())?;

    let new_item = NewItem::new(kind, args.title.clone()).with_attributes(attributes);
    let id = library.add_item(&new_item, &user)?;
    ctx.save_library(&library)?;
    info!(item = %id, kind = kind.as_str(), contributor = %user, "added item");

    if ctx.cli().json {
        let item = library.get_item(id)?;
        println!("{}", serde_json::to_string_pretty(&item_json(item))?);
    } else if !ctx.quiet() {
        let id_text = id.to_string();
        print(
            &ui,
            &receipt(
                &ui,
                "Item added",
                &[("ID", &id_text), ("Type", kind.label()), ("Title", &args.title)],
            ),
        );
    }
    Ok(())
}

pub fn handle_show(ctx: &AppContext, args: &ItemArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let id = parse_item_id(&args.id)?;
    let library = ctx.load_library()?;
    let item = library.get_item(id)?;

    if ctx.cli().json {
        println!("{}", serde_json::to_string_pretty(&item_json(item))?);
    } else {
        print(&ui, &item_detail(&ui, item, library.ledger().active(id)));
    }
    Ok(())
}

/// Build a filter from the search flags.
pub fn search_filter(args: &SearchArgs) -> anyhow::Result<SearchFilter> {
    let mut filter = SearchFilter::new();
    if let Some(kind) = args.r#type.as_deref() {
        filter = filter.kind(parse_kind(kind)?);
    }
    if let Some(title) = args.title.as_deref() {
        filter = filter.title(title);
    }
    if let Some(contributor) = args.contributor.as_deref() {
        filter = filter.contributor(contributor);
    }
    if args.available {
        filter = filter.availability(Availability::Available);
    } else if args.borrowed {
        filter = filter.availability(Availability::Borrowed);
    }
    if let Some(term) = args.term.as_deref() {
        filter = filter.text(term);
    }
    Ok(filter)
}

pub fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let filter = search_filter(args)?;
    let library = ctx.load_library()?;
    let results: Vec<_> = library.search(&filter).collect();

    if ctx.cli().json {
        println!("{}", serde_json::to_string_pretty(&items_json(results))?);
        return Ok(());
    }
    if results.is_empty() {
        if !ctx.quiet() {
            print(&ui, "No items found.");
            if !filter.is_empty() {
                print(&ui, &hint(&ui, "Try fewer filters, or run `donorware search` to list everything."));
            }
        }
        return Ok(());
    }
    print(&ui, &item_table(&ui, results));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorware_core::ItemKind;

    fn args() -> SearchArgs {
        SearchArgs {
            term: None,
            r#type: None,
            title: None,
            contributor: None,
            available: false,
            borrowed: false,
        }
    }

    #[test]
    fn test_empty_flags_build_empty_filter() {
        assert!(search_filter(&args()).unwrap().is_empty());
    }

    #[test]
    fn test_flags_map_to_filter() {
        let filter = search_filter(&SearchArgs {
            term: Some("dune".into()),
            r#type: Some("book".into()),
            borrowed: true,
            ..args()
        })
        .unwrap();
        assert_eq!(filter.kind, Some(ItemKind::Book));
        assert_eq!(filter.availability, Some(Availability::Borrowed));
        assert_eq!(filter.text.as_deref(), Some("dune"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = search_filter(&SearchArgs {
            r#type: Some("scroll".into()),
            ..args()
        });
        assert!(result.is_err());
    }
}
