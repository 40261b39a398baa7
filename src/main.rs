//! chunkwise - Main CLI Entry Point
//!
//! Runs one chunked operation to completion, following the continuation
//! token chain and printing one JSON envelope per chunk on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use chunkwise::{
    chunking::{ChunkingEngine, TextEncoding},
    cli::{Args, Commands, Config},
    response::ResponseEnvelope,
    session::{ChunkSession, SearchMode},
    sources,
    telemetry::{self, TelemetryCollector, TelemetryDisplay},
    tokens::RequestParams,
};
use serde_json::json;
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();
    telemetry::init_tracing(verbosity);

    let config = Config::load(args.config.clone())
        .and_then(|c| c.with_overrides(args.max_bytes, args.probe_step))
        .context("Failed to load configuration")?;

    if let Commands::Config = args.command {
        println!("{}", toml::to_string_pretty(&config).context("Failed to render configuration")?);
        return Ok(());
    }

    let store = config.token_store().context("Failed to create token store")?;
    let collector = TelemetryCollector::new();
    let session = ChunkSession::with_config(
        &store,
        ChunkingEngine::with_config(config.chunking.clone()),
        config.size.clone(),
    )
    .with_telemetry(collector.clone());

    let result = run(&args.command, &session);

    // Tokens live only as long as this process
    store.clear();
    TelemetryDisplay::new(collector, verbosity).display_summary();

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: &Commands, session: &ChunkSession<'_>) -> Result<()> {
    match command {
        Commands::Read { file, bytes, encoding } => {
            let target = target_name(file);
            if *bytes {
                let encoding: TextEncoding = encoding.parse().map_err(anyhow::Error::msg)?;
                let buffer = sources::read_raw(file)?;
                let params = request_params(json!({ "path": target, "mode": "bytes", "encoding": encoding }));
                drain(|resume| session.read_bytes(&target, &buffer, encoding, resume, params.clone()))
            } else {
                let text = sources::read_text(file)?;
                let params = request_params(json!({ "path": target, "mode": "lines" }));
                drain(|resume| session.read_lines(&target, &text, resume, params.clone()))
            }
        }
        Commands::List { dir, recursive } => {
            let target = target_name(dir);
            let params = request_params(json!({ "path": target, "recursive": recursive }));
            drain(|resume| {
                // Re-list on every page, as a remote caller would
                let entries = sources::list_entries(dir, *recursive)?;
                session.list_directory(&target, entries, resume, params.clone())
            })
        }
        Commands::Search { root, pattern, names } => {
            let target = target_name(root);
            let mode = if *names { SearchMode::Filename } else { SearchMode::Content };
            let params = request_params(json!({ "path": target, "pattern": pattern, "mode": mode }));
            drain(|resume| {
                let matches = match mode {
                    SearchMode::Content => sources::search_content(root, pattern)?,
                    SearchMode::Filename => sources::search_filenames(root, pattern)?,
                };
                session.search(mode, &target, matches, resume, params.clone())
            })
        }
        Commands::Config => Ok(()),
    }
}

/// Follow the token chain until the final chunk
fn drain<F>(mut next_chunk: F) -> Result<()>
where
    F: FnMut(Option<&str>) -> chunkwise::Result<ResponseEnvelope>,
{
    let mut resume: Option<String> = None;

    loop {
        let envelope = next_chunk(resume.as_deref())?;
        println!("{}", serde_json::to_string(&envelope)?);

        if !envelope.has_more() {
            return Ok(());
        }
        resume = envelope.continuation_token().map(str::to_string);
        if resume.is_none() {
            anyhow::bail!("chunk reported more data without a continuation token");
        }
    }
}

fn target_name(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn request_params(value: serde_json::Value) -> RequestParams {
    match value {
        serde_json::Value::Object(map) => map,
        _ => RequestParams::new(),
    }
}
