//! `tmpl-reconcile`: reconcile record templates in a local page file
//!
//! Reconciled page text goes to stdout; the edit summary, diagnostics and
//! logs go to stderr.

mod inputs;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tmpl_decision::{HandoffSlot, Snapshot, TemplateChoice};
use tmpl_reconcile::{PageContext, ReconcileConfig, Reconciler, StaticCategoryGraph, StaticPageDirectory, StaticSchemaSource};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("tmpl-reconcile")
        .version(tmpl_reconcile::VERSION)
        .about("Reconcile record-template parameters against their schema")
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs as JSON lines"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("reconcile")
                .about("Reconcile every record template in a page")
                .arg(
                    Arg::new("title")
                        .long("title")
                        .required(true)
                        .help("Page title"),
                )
                .arg(
                    Arg::new("text")
                        .long("text")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Page text file, or - for stdin"),
                )
                .arg(
                    Arg::new("schema")
                        .long("schema")
                        .value_parser(value_parser!(PathBuf))
                        .help("TemplateData document (.json, .yaml)"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .action(ArgAction::Append)
                        .help("Page category (repeatable)"),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .value_parser(value_parser!(PathBuf))
                        .help("File listing page categories, one per line"),
                )
                .arg(
                    Arg::new("parents")
                        .long("parents")
                        .value_parser(value_parser!(PathBuf))
                        .help("Parent category table (.json, .yaml)"),
                )
                .arg(
                    Arg::new("existing")
                        .long("existing")
                        .value_parser(value_parser!(PathBuf))
                        .help("File listing existing page titles, one per line"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Configuration file (TOML)"),
                )
                .arg(
                    Arg::new("snapshot-out")
                        .long("snapshot-out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the encoded decision snapshot here"),
                ),
        )
        .subcommand(
            Command::new("show-snapshot")
                .about("Print the decisions held in an encoded snapshot")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot file"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("reconcile", args)) => reconcile(args).await,
        Some(("show-snapshot", args)) => show_snapshot(args),
        _ => Ok(()),
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
}

async fn reconcile(args: &ArgMatches) -> Result<()> {
    let config = match path_arg(args, "config") {
        Some(path) => inputs::load_config(path)?,
        None => ReconcileConfig::default(),
    };

    let mut schemas = StaticSchemaSource::new();
    if let Some(path) = path_arg(args, "schema") {
        schemas = schemas.with_schema(inputs::load_schema(path, &config.canonical_template_name)?);
    }
    let graph = match path_arg(args, "parents") {
        Some(path) => inputs::load_parents(path)?,
        None => StaticCategoryGraph::new(),
    };
    let pages = match path_arg(args, "existing") {
        Some(path) => inputs::load_pages(path)?,
        None => StaticPageDirectory::new(),
    };

    let mut categories: Vec<String> = args
        .get_many::<String>("category")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if let Some(path) = path_arg(args, "categories") {
        categories.extend(inputs::load_lines(path)?);
    }

    let title = args.get_one::<String>("title").context("--title is required")?;
    let text_path = path_arg(args, "text").context("--text is required")?;
    let page = PageContext::new(title.as_str(), inputs::read_text(text_path)?).with_categories(categories);

    let reconciler = Reconciler::new(config, Arc::new(schemas), Arc::new(graph), Arc::new(pages));
    let slot = HandoffSlot::new();
    let result = reconciler.reconcile_into(&page, &slot).await?;

    print!("{}", result.text);
    if !result.summary.is_empty() {
        eprintln!("Summary: {}", result.summary);
    }
    report(&result.snapshot);

    if let Some(path) = path_arg(args, "snapshot-out") {
        let encoded = slot.take().context("no snapshot was produced")?;
        std::fs::write(path, encoded).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), run = %result.snapshot.run_id(), "Snapshot written");
    }
    Ok(())
}

fn show_snapshot(args: &ArgMatches) -> Result<()> {
    let path = path_arg(args, "file").context("snapshot file is required")?;
    let snapshot = Snapshot::decode(&inputs::read_text(path)?)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    println!("Run {}", snapshot.run_id());
    for (index, choice) in snapshot.templates.iter().enumerate() {
        println!();
        println!("Instance {} ({})", index + 1, choice.schema().title());
        print_fields(choice);
        println!();
        println!("{}", choice.emit(choice.schema().title()));
    }
    report(&snapshot);
    Ok(())
}

fn print_fields(choice: &TemplateChoice) {
    let ordered = choice
        .schema()
        .order(choice.iter().map(|(key, param)| (key.clone(), param)));
    for param in ordered.values() {
        let source = if param.prefer_original { "written" } else { "proposed" };
        println!(
            "  {:<16} {:<9} {}",
            param.display_key(),
            source,
            param.chosen_value().unwrap_or("(dropped)")
        );
    }
}

/// Print every diagnostic of a snapshot to stderr
fn report(snapshot: &Snapshot) {
    for diagnostic in &snapshot.diagnostics {
        eprintln!("{diagnostic}");
    }
    for choice in &snapshot.templates {
        for diagnostic in &choice.diagnostics {
            eprintln!("{diagnostic}");
        }
        for (_, param) in choice.iter() {
            for diagnostic in &param.diagnostics {
                eprintln!("{}: {diagnostic}", param.display_key());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn reconcile_arguments_parse() {
        let matches = cli()
            .try_get_matches_from([
                "tmpl-reconcile",
                "reconcile",
                "--title",
                "Journal of Tests",
                "--text",
                "page.txt",
                "--category",
                "Monthly journals",
                "--category",
                "Chemistry journals",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "reconcile");
        let categories: Vec<&String> = args.get_many::<String>("category").unwrap().collect();
        assert_eq!(categories.len(), 2);
        assert_eq!(path_arg(args, "text"), Some(&PathBuf::from("page.txt")));
    }

    #[test]
    fn title_is_required() {
        assert!(cli()
            .try_get_matches_from(["tmpl-reconcile", "reconcile", "--text", "page.txt"])
            .is_err());
    }
}
