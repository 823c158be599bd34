//! Command-line front end for the replacement tracker.
//!
//! # Responsibility
//! - Map subcommands onto `TrackerService` actions.
//! - Render the urgency-ordered list as plain text.
//!
//! # Invariants
//! - Every command opens the store, applies at most one action, and exits.
//! - Deletion prompts for confirmation unless `--yes` is passed.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use retrack_core::db::open_db;
use retrack_core::{
    default_log_level, init_logging, AddItemRequest, Catalog, CategoryFilter, Clock, ItemId,
    ItemRow, KeyValueStore, LabelKind, SqliteKeyValueStore, SystemClock, TrackerConfig,
    TrackerService,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const DEFAULT_DB_FILE: &str = "retrack.sqlite3";
const SHORT_ID_LEN: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "retrack", version, about = "Track recurring replacements and services")]
struct Cli {
    /// SQLite database holding the item list
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// JSON config file (categories, verbs, default interval)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add an item serviced today
    Add {
        name: String,
        /// Days between services (config default when omitted)
        #[arg(short, long)]
        interval: Option<u32>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        verb: Option<String>,
    },
    /// Show items, most overdue first
    List(ListArgs),
    /// Mark an item as serviced today
    Replace { id: String },
    Rename { id: String, name: String },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Adjust the last-done date, next-due date, or interval
    EditDates {
        id: String,
        /// New last-done date (YYYY-MM-DD); keeps the interval
        #[arg(long)]
        last: Option<String>,
        /// New next-due date (YYYY-MM-DD); recomputes the interval
        #[arg(long, conflicts_with = "interval")]
        next: Option<String>,
        #[arg(long)]
        interval: Option<u32>,
    },
    /// Set the action label, or clear it when omitted
    Verb { id: String, verb: Option<String> },
    /// Set the category, or clear it when omitted
    Category { id: String, category: Option<String> },
    /// Print the configured categories and verbs
    Categories,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only items in this category
    #[arg(short, long, conflicts_with = "uncategorized")]
    category: Option<String>,
    /// Only items without a category
    #[arg(long)]
    uncategorized: bool,
}

impl ListArgs {
    /// Builds the row filter, mapping the category onto its catalog label.
    fn filter(&self, catalog: &Catalog) -> Result<CategoryFilter> {
        match (&self.category, self.uncategorized) {
            (Some(input), _) => match catalog.resolve(LabelKind::Category, input) {
                Some(label) => Ok(CategoryFilter::Only(label.to_string())),
                None => bail!("unknown category `{}`", input.trim()),
            },
            (None, true) => Ok(CategoryFilter::Uncategorized),
            (None, false) => Ok(CategoryFilter::All),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let mut service = TrackerService::open(SqliteKeyValueStore::new(&conn), SystemClock, config)?;

    run(&mut service, cli.command)
}

fn run<K: KeyValueStore, C: Clock>(
    service: &mut TrackerService<K, C>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Add {
            name,
            interval,
            category,
            verb,
        } => {
            let request = AddItemRequest {
                name,
                interval_days: interval,
                category,
                verb,
            };
            let id = service.add_item(request)?;
            println!("added {}", short_id(id));
        }
        Command::List(args) => {
            let filter = args.filter(&service.config().catalog)?;
            print_rows(&service.rows(&filter));
        }
        Command::Replace { id } => {
            let id = resolve_id(service, &id)?;
            service.replace_now(id)?;
            println!("replaced {}", short_id(id));
        }
        Command::Rename { id, name } => {
            let id = resolve_id(service, &id)?;
            service.rename(id, &name)?;
            println!("renamed {}", short_id(id));
        }
        Command::Delete { id, yes } => {
            let id = resolve_id(service, &id)?;
            service.request_delete(id)?;
            let name = service
                .get(id)
                .map(|item| item.name.clone())
                .unwrap_or_default();
            if yes || confirm(&format!("Delete \"{name}\"?"))? {
                service.confirm_delete()?;
                println!("deleted {}", short_id(id));
            } else {
                service.cancel_delete();
                println!("kept {}", short_id(id));
            }
        }
        Command::EditDates {
            id,
            last,
            next,
            interval,
        } => {
            let id = resolve_id(service, &id)?;
            edit_dates(service, id, last, next, interval)?;
            if let Some(item) = service.get(id) {
                println!(
                    "{}: last {} every {} days",
                    short_id(id),
                    item.last_replaced,
                    item.interval_days
                );
            }
        }
        Command::Verb { id, verb } => {
            let id = resolve_id(service, &id)?;
            service.set_verb(id, verb.as_deref())?;
        }
        Command::Category { id, category } => {
            let id = resolve_id(service, &id)?;
            service.set_category(id, category.as_deref())?;
        }
        Command::Categories => {
            let catalog = &service.config().catalog;
            for kind in [LabelKind::Category, LabelKind::Verb] {
                println!("{kind}: {}", catalog.labels(kind).join(", "));
            }
        }
    }
    Ok(())
}

/// Runs one date edit through the draft; any rejected input discards it.
fn edit_dates<K: KeyValueStore, C: Clock>(
    service: &mut TrackerService<K, C>,
    id: ItemId,
    last: Option<String>,
    next: Option<String>,
    interval: Option<u32>,
) -> Result<()> {
    if last.is_none() && next.is_none() && interval.is_none() {
        bail!("nothing to edit; pass --last, --next, or --interval");
    }
    service.begin_date_edit(id)?;
    if let Err(err) = apply_date_edits(service, id, last, next, interval) {
        service.cancel_date_edit(id);
        return Err(err);
    }
    service.commit_date_edit(id)?;
    Ok(())
}

/// Applies last, then interval, then next, so an explicit next date wins.
fn apply_date_edits<K: KeyValueStore, C: Clock>(
    service: &mut TrackerService<K, C>,
    id: ItemId,
    last: Option<String>,
    next: Option<String>,
    interval: Option<u32>,
) -> Result<()> {
    if let Some(last) = last {
        service.edit_last_replaced(id, &last)?;
    }
    if let Some(interval) = interval {
        service.edit_interval(id, interval)?;
    }
    if let Some(next) = next {
        service.edit_next_date(id, &next)?;
    }
    Ok(())
}

/// Finds the single item whose id starts with `input`.
fn resolve_id<K: KeyValueStore, C: Clock>(
    service: &TrackerService<K, C>,
    input: &str,
) -> Result<ItemId> {
    let needle = input.trim().to_ascii_lowercase();
    if needle.is_empty() {
        bail!("item id must not be empty");
    }
    let mut matches = service
        .items()
        .iter()
        .filter(|item| item.id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item.id),
        (None, _) => bail!("no item matches id `{input}`"),
        (Some(_), Some(_)) => bail!("id `{input}` is ambiguous; use more characters"),
    }
}

fn short_id(id: ItemId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_rows(rows: &[ItemRow<'_>]) {
    if rows.is_empty() {
        println!("no items");
        return;
    }
    for row in rows {
        let item = row.item;
        let label = match &item.verb {
            Some(verb) => format!("{verb} {}", item.name),
            None => item.name.clone(),
        };
        println!(
            "{}  {:<32} {:<12} last {}  next {}  {}",
            short_id(item.id),
            label,
            item.category.as_deref().unwrap_or("-"),
            item.last_replaced,
            row.next_date,
            row.status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{edit_dates, resolve_id, ListArgs};
    use retrack_core::{
        parse_date, AddItemRequest, CategoryFilter, FixedClock, KeyValueStore,
        MemoryKeyValueStore, TrackerConfig, TrackerService,
    };

    const SEEDED: &str = r#"[
        {"id":"aaaa1111-2222-4333-8444-555555555555","name":"Water filter","replacementInterval":90,"lastReplaced":"2024-03-01"},
        {"id":"aaaa2222-2222-4333-8444-555555555555","name":"Fern","replacementInterval":3,"lastReplaced":"2024-04-28"},
        {"id":"bbbb1111-2222-4333-8444-555555555555","name":"Toothbrush head","replacementInterval":90,"lastReplaced":"2024-02-01"}
    ]"#;

    fn service() -> TrackerService<MemoryKeyValueStore, FixedClock> {
        let config = TrackerConfig::default();
        let backend = MemoryKeyValueStore::new();
        backend.set(&config.storage_key, SEEDED).unwrap();
        let clock = FixedClock::new(parse_date("2024-05-01").unwrap());
        TrackerService::open(backend, clock, config).unwrap()
    }

    #[test]
    fn resolve_id_needs_a_unique_prefix() {
        let service = service();

        let id = resolve_id(&service, " BBBB ").unwrap();
        assert_eq!(service.get(id).unwrap().name, "Toothbrush head");
        let id = resolve_id(&service, "aaaa2").unwrap();
        assert_eq!(service.get(id).unwrap().name, "Fern");

        let err = resolve_id(&service, "aaaa").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
        let err = resolve_id(&service, "cccc").unwrap_err();
        assert!(err.to_string().contains("no item matches"));
        assert!(resolve_id(&service, "  ").is_err());
    }

    #[test]
    fn edit_dates_applies_next_after_last_and_interval() {
        let mut service = service();
        let id = resolve_id(&service, "bbbb").unwrap();

        edit_dates(
            &mut service,
            id,
            Some("2024-04-01".to_string()),
            Some("2024-04-15".to_string()),
            Some(5),
        )
        .unwrap();

        let item = service.get(id).unwrap();
        assert_eq!(item.last_replaced, parse_date("2024-04-01").unwrap());
        assert_eq!(item.interval_days, 14);
        assert!(service.date_edit(id).is_none());
    }

    #[test]
    fn rejected_date_input_discards_the_whole_edit() {
        let mut service = service();
        let id = resolve_id(&service, "bbbb").unwrap();
        let before = service.get(id).unwrap().clone();

        let result = edit_dates(
            &mut service,
            id,
            Some("2024-04-01".to_string()),
            Some("soon".to_string()),
            None,
        );
        assert!(result.is_err());
        assert!(service.date_edit(id).is_none());
        assert_eq!(service.get(id).unwrap(), &before);

        assert!(edit_dates(&mut service, id, None, None, None).is_err());
        assert!(service.date_edit(id).is_none());
    }

    #[test]
    fn list_filter_resolves_catalog_labels() {
        let service = service();
        let catalog = &service.config().catalog;
        let args = |category: Option<&str>, uncategorized| ListArgs {
            category: category.map(str::to_string),
            uncategorized,
        };

        assert_eq!(
            args(Some(" kitchen "), false).filter(catalog).unwrap(),
            CategoryFilter::Only("Kitchen".to_string())
        );
        assert!(args(Some("Attic"), false).filter(catalog).is_err());
        assert_eq!(
            args(None, true).filter(catalog).unwrap(),
            CategoryFilter::Uncategorized
        );
        assert_eq!(args(None, false).filter(catalog).unwrap(), CategoryFilter::All);
    }

    #[test]
    fn added_items_are_found_by_their_short_id() {
        let mut service = service();
        let id = service.add_item(AddItemRequest::new("Brita filter")).unwrap();
        let short = super::short_id(id);
        assert_eq!(resolve_id(&service, &short).unwrap(), id);
    }
}
