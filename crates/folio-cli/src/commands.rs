use anyhow::Context;
use colored::Colorize;
use folio_sdk::{DropCandidate, FilterRules, FolderManager, FolderReference, FolioConfig, ReferenceStore};
use tracing::debug;

use crate::cli::*;
use crate::prompt::{absolute, PromptDialog};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    if let Command::Add(AddArgs { timeout_ms: Some(ms), .. }) = &cli.command {
        config.ingest.resolve_timeout_ms = Some(*ms);
    }

    match cli.command {
        Command::List => cmd_list(&open(&config)?, &cli.format),
        Command::Add(args) => cmd_add(&open(&config)?, args, &cli.format),
        Command::Remove(args) => cmd_remove(&open(&config)?, args),
        Command::Pick(args) => cmd_pick(&open(&config)?, args),
        Command::Open(args) => cmd_open(&open(&config)?, args),
        Command::Config => cmd_config(&config, &cli.format),
    }
}

fn open(config: &FolioConfig) -> anyhow::Result<FolderManager> {
    FolderManager::open(config).context("failed to open the folder list")
}

fn load_config(cli: &Cli) -> anyhow::Result<FolioConfig> {
    let mut config = match &cli.config {
        Some(path) => FolioConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FolioConfig::default(),
    };
    if let Some(dir) = &cli.dir {
        config.store.storage_dir = Some(dir.clone());
    }
    if let Some(key) = &cli.key {
        config.store.storage_key = key.clone();
    }
    debug!(
        storage_dir = ?config.store.storage_dir,
        storage_key = %config.store.storage_key,
        "configuration resolved"
    );
    Ok(config)
}

fn rules_for(filter: KindArgs) -> FilterRules {
    FilterRules::any().with_kinds(filter.kinds)
}

fn print_paths(references: &[FolderReference], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(references)?),
        OutputFormat::Text => {
            for (i, r) in references.iter().enumerate() {
                println!("{:>3}  {}  {}", i + 1, r.display_name().bold(), r.to_string().dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_list(manager: &FolderManager, format: &OutputFormat) -> anyhow::Result<()> {
    let folders = manager.list_folders()?;
    if folders.is_empty() && matches!(format, OutputFormat::Text) {
        println!("No folders saved.");
    } else {
        print_paths(&folders, format)?;
    }

    let report = manager.store().load_report();
    if report.stale > 0 {
        eprintln!("{} {} saved folder(s) no longer resolve and are hidden", "!".yellow().bold(), report.stale);
    }
    if report.undecodable > 0 {
        eprintln!("{} {} saved entr(ies) could not be read", "!".yellow().bold(), report.undecodable);
    }
    Ok(())
}

fn cmd_add(manager: &FolderManager, args: AddArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let requested = args.paths.len();
    let rules = rules_for(args.filter);
    let candidates = args
        .paths
        .into_iter()
        .map(|p| DropCandidate::for_path(absolute(p)))
        .collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let added = runtime.block_on(manager.add_folders(candidates, &rules))?;

    match format {
        OutputFormat::Json => print_paths(&added, format)?,
        OutputFormat::Text => {
            for r in &added {
                println!("  {} {}", "added:".green(), r);
            }
            println!("{} {} of {} folder(s) added", "✓".green().bold(), added.len(), requested);
        }
    }
    Ok(())
}

fn cmd_remove(manager: &FolderManager, args: RemoveArgs) -> anyhow::Result<()> {
    let reference = FolderReference::new(absolute(args.path))?;
    if manager.remove_folder(&reference)? {
        println!("{} Removed {}", "✓".green().bold(), reference.to_string().yellow());
    } else {
        println!("{} is not in the list", reference.to_string().yellow());
    }
    Ok(())
}

fn cmd_pick(manager: &FolderManager, args: PickArgs) -> anyhow::Result<()> {
    let rules = rules_for(args.filter);
    match manager.pick_folder(&PromptDialog, &rules)? {
        Some(reference) => println!("{} Picked {}", "✓".green().bold(), reference.to_string().yellow()),
        None => println!("No folder picked."),
    }
    Ok(())
}

fn cmd_open(manager: &FolderManager, args: OpenArgs) -> anyhow::Result<()> {
    let reference = FolderReference::new(absolute(args.path))?;
    let scope = manager.open_folder(&reference)?;
    println!("{} {} is accessible", "✓".green().bold(), scope.path().display().to_string().yellow());
    Ok(())
}

fn cmd_config(config: &FolioConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if shown.token_secret.is_some() {
        shown.token_secret = Some("(set)".into());
    }
    let location = ReferenceStore::storage_path(&shown.store);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Text => {
            print!("{}", toml::to_string_pretty(&shown)?);
            match location {
                Ok(path) => println!("\n# archive: {}", path.display()),
                Err(e) => println!("\n# archive: {}", e.to_string().red()),
            }
        }
    }
    Ok(())
}
