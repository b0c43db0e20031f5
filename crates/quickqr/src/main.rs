//! `quickqr` - CLI for scanning and generating QR codes
//!
//! This binary records decoded scans and generated codes in the local history
//! and lets the user browse and prune it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use quickqr::cli::{
    log_kind, Cli, Command, ConfigCommand, GenerateCommand, HistoryCommand, OutputFormat,
    ScanCommand, ValidateKind,
};
use quickqr::encode::{decode_data_url, download_file_name};
use quickqr::{
    init_logging, is_valid_email, is_valid_phone, is_valid_url, Config, EncodeOptions,
    EntryType, HistoryEntry, HistoryStore, LoadOutcome, LogKind, QrPayload, SqliteStore,
    SvgQrEncoder,
};

type History = HistoryStore<SqliteStore>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Scan(cmd) => handle_scan(&mut open_history(&config)?, &cmd),
        Command::Generate(cmd) => handle_generate(&mut open_history(&config)?, &config, cmd),
        Command::History(cmd) => handle_history(&mut open_history(&config)?, cmd),
        Command::Validate(cmd) => Ok(handle_validate(cmd.kind, &cmd.value)),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_history(config: &Config) -> anyhow::Result<History> {
    let path = config.database_path();
    let backend = SqliteStore::open(&path)
        .with_context(|| format!("cannot open history at {}", path.display()))?;
    Ok(HistoryStore::open(backend, &config.storage))
}

fn handle_scan(history: &mut History, cmd: &ScanCommand) -> anyhow::Result<ExitCode> {
    let entry = match history.record_scan(&cmd.content) {
        Ok(entry) => entry,
        Err(e) if e.is_user_error() => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{}", entry.title);
        println!("  Type:    {}", entry.entry_type);
        println!("  Content: {}", entry.content);
        if entry.entry_type.is_actionable() {
            println!("  Open:    {}", entry.content);
        }
        println!("  Id:      {}", entry.id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_generate(
    history: &mut History,
    config: &Config,
    cmd: GenerateCommand,
) -> anyhow::Result<ExitCode> {
    let out_dir = match (cmd.out, cmd.save) {
        (Some(dir), _) => Some(dir),
        (None, true) => Some(config.output_dir()),
        (None, false) => None,
    };
    let payload = QrPayload::from(cmd.payload);
    let options = EncodeOptions::from(&config.generator);

    let entry = match history.record_generated(&payload, &SvgQrEncoder, &options) {
        Ok(entry) => entry,
        Err(e) if e.is_user_error() => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", entry.title);
    println!("  Type:    {}", entry.entry_type);
    println!("  Content: {}", entry.content);
    println!("  Id:      {}", entry.id);

    if let Some(dir) = out_dir {
        let path = save_image(&entry, &dir)?;
        println!("  Saved:   {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn save_image(entry: &HistoryEntry, dir: &Path) -> anyhow::Result<std::path::PathBuf> {
    let image = entry
        .qr_code
        .as_deref()
        .context("generated entry has no image")?;
    let data = decode_data_url(image)?;
    let name = download_file_name(
        entry.entry_type,
        entry.timestamp.timestamp_millis(),
        data.extension(),
    );

    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, &data.bytes).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

fn handle_history(history: &mut History, cmd: HistoryCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        HistoryCommand::List {
            generated,
            entry_type,
            limit,
            format,
        } => {
            let filter = entry_type.map(EntryType::from);
            let entries: Vec<&HistoryEntry> = history
                .log(log_kind(generated))
                .iter()
                .filter(|e| filter.is_none() || filter == Some(e.entry_type))
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            print_entries(&entries, format)?;
        }
        HistoryCommand::Show {
            id,
            generated,
            json,
        } => {
            let Some(entry) = history.log(log_kind(generated)).get(&id) else {
                eprintln!("No entry with id {id}");
                return Ok(ExitCode::FAILURE);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(entry)?);
            } else {
                println!("{}", entry.title);
                println!("  Type:    {}", entry.entry_type);
                println!("  Date:    {}", entry.display_time());
                println!("  Content: {}", entry.content);
            }
        }
        HistoryCommand::Delete { id, generated } => {
            if history.delete(log_kind(generated), &id) {
                println!("Deleted {id}");
            } else {
                println!("No entry with id {id}");
            }
        }
        HistoryCommand::Clear { generated, yes } => {
            let kind = log_kind(generated);
            if yes {
                let removed = history.clear(kind);
                println!("Removed {removed} {kind} entries.");
            } else {
                println!(
                    "This will delete all {} {kind} entries.",
                    history.log(kind).len()
                );
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_entries(entries: &[&HistoryEntry], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No entries.");
                return Ok(());
            }
            println!("{:<18} {:<6} {:<18} TITLE", "ID", "TYPE", "DATE");
            for entry in entries {
                println!(
                    "{:<18} {:<6} {:<18} {}",
                    entry.id,
                    entry.entry_type.as_str(),
                    entry.display_time(),
                    entry.title
                );
            }
        }
        OutputFormat::Plain => {
            for entry in entries {
                println!("{}  {}", entry.display_time(), entry.title);
                println!("    {}", entry.content);
            }
        }
    }
    Ok(())
}

fn handle_validate(kind: ValidateKind, value: &str) -> ExitCode {
    let valid = match kind {
        ValidateKind::Url => is_valid_url(value),
        ValidateKind::Email => is_valid_email(value),
        ValidateKind::Phone => is_valid_phone(value),
    };
    if valid {
        println!("valid");
        ExitCode::SUCCESS
    } else {
        println!("invalid");
        ExitCode::FAILURE
    }
}

fn describe_load(outcome: &LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { count } => format!("loaded {count}"),
        LoadOutcome::Absent => "empty".to_string(),
        LoadOutcome::Corrupt { reason } => format!("corrupt record ignored ({reason})"),
        LoadOutcome::Unreadable { reason } => format!("unreadable ({reason})"),
    }
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<ExitCode> {
    let history = open_history(config)?;
    let stats = history.backend().stats()?;
    let limit = config.storage.max_persist_bytes;

    if json {
        let logs: Vec<_> = [LogKind::Scanned, LogKind::Generated]
            .into_iter()
            .map(|kind| {
                serde_json::json!({
                    "log": kind.to_string(),
                    "key": kind.storage_key(),
                    "entries": history.log(kind).len(),
                    "capacity": history.log(kind).capacity(),
                    "stored_bytes": stats.bytes_for(kind.storage_key()),
                    "load": describe_load(history.load_outcome(kind)),
                })
            })
            .collect();
        let status = serde_json::json!({
            "database_path": history.backend().path(),
            "database_bytes": stats.db_size_bytes,
            "max_persist_bytes": limit,
            "logs": logs,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("quickqr status");
        println!("--------------");
        println!("Database:      {}", history.backend().path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Record limit:  {limit} bytes");
        for kind in [LogKind::Scanned, LogKind::Generated] {
            let log = history.log(kind);
            println!();
            println!("[{kind}]");
            println!("  Entries:     {}/{}", log.len(), log.capacity());
            println!("  Stored:      {} bytes", stats.bytes_for(kind.storage_key()));
            println!("  Load:        {}", describe_load(history.load_outcome(kind)));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let generator = &config.generator;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Max entries:        {}", config.storage.max_entries);
                println!("  Max record bytes:   {}", config.storage.max_persist_bytes);
                println!();
                println!("[Generator]");
                println!("  Width:              {}", generator.width);
                println!("  Margin:             {}", generator.margin);
                println!("  Error correction:   {:?}", generator.error_correction);
                println!("  Dark color:         {}", generator.dark_color);
                println!("  Light color:        {}", generator.light_color);
                println!("  Output directory:   {}", config.output_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
