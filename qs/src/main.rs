use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use querystash::cli::{Cli, Command};
use querystash::config::Config;
use querystash::export::export_chat;
use querystash::listing::{DateFilter, DateMode, ListOptions, list_files};
use querystash::search::SearchOptions;
use querystash::tools::{RunSummary, persist_find, persist_grep};
use querystash::{PageRequest, ResultEntry, RunStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    // stdout is reserved for tool output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize logging: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let workspace_root = config.resolve_workspace_root(cli.workspace.as_deref(), &cwd);
    let store = RunStore::new(config.runs_root(&workspace_root));
    info!(workspace = ?workspace_root, runs = ?store.root(), "querystash starting");

    match cli.command {
        Command::Find {
            pattern,
            path,
            regex,
            recursive,
        } => {
            let root = path.unwrap_or_else(|| workspace_root.clone());
            print_banner("Find");
            println!("Query:   {} '{}'", if regex { "Regex" } else { "Glob" }, pattern);
            println!("Target:  {}", root.display());
            println!("{}", "-".repeat(24));

            let options = search_options(&store, regex, recursive);
            let summary = persist_find(&store, &pattern, &root, &options).context("Find failed")?;
            print_summary("FIND", &summary);
        }
        Command::Grep {
            query,
            file_pattern,
            path,
            regex,
            recursive,
        } => {
            let root = path.unwrap_or_else(|| workspace_root.clone());
            print_banner("Grep");
            println!("Query:        {} '{}'", if regex { "Regex" } else { "String" }, query);
            println!("File Pattern: {}", file_pattern);
            println!("Target:       {}", root.display());
            println!("{}", "-".repeat(24));

            let options = search_options(&store, regex, recursive);
            let summary = persist_grep(&store, &query, &file_pattern, &root, &options).context("Grep failed")?;
            print_summary("GREP", &summary);
        }
        Command::View {
            run_id,
            list,
            tool,
            limit,
            offset,
            full,
        } => {
            let request = PageRequest::new(offset, limit.unwrap_or(config.default_limit), full)?;
            match run_id {
                Some(run_id) if !list => cmd_view_run(&store, &run_id, tool.as_deref(), request)?,
                _ => cmd_list_runs(&store, tool.as_deref())?,
            }
        }
        Command::Ls {
            root,
            pattern,
            recursive,
            dirs,
            date,
            mode,
            json,
        } => cmd_ls(root, pattern, recursive, dirs, date.as_deref(), mode, json)?,
        Command::Export {
            source,
            output,
            max_lines,
        } => {
            let max_lines = max_lines.unwrap_or(config.export_max_lines);
            let written = export_chat(&source, &output, max_lines, Local::now())
                .context(format!("Failed to export {}", source.display()))?;
            if written.is_empty() {
                println!("No chat requests found in {}", source.display());
            } else {
                for path in &written {
                    println!("{} {}", "✓".green(), path.display());
                }
                println!("Exported {} file(s) from {}", written.len(), source.display());
            }
        }
    }

    Ok(())
}

fn search_options(store: &RunStore, regex: bool, recursive: bool) -> SearchOptions {
    SearchOptions {
        regex,
        recursive,
        exclude: vec![store.root().to_path_buf()],
    }
}

fn print_banner(tool: &str) {
    println!("--- querystash: {} ---", tool);
}

fn print_summary(label: &str, summary: &RunSummary) {
    println!("{} OPERATION COMPLETE.", label);
    println!("Total Matches Found:  {}", summary.count);
    if let Some(files) = summary.file_count {
        println!("Matches Across Files: {}", files);
    }
    println!("Results Persisted To: {}", summary.results_path.display());
    println!("Run ID:               {}", summary.run_id.cyan());
    println!("{}", "-".repeat(24));
    println!("Use `qs view {}` to page through the results.", summary.run_id);
}

fn cmd_list_runs(store: &RunStore, tool: Option<&str>) -> Result<()> {
    debug!(?tool, "cmd_list_runs: called");
    print_banner("Result Viewer");

    let runs = store.list_runs(tool)?;
    if runs.is_empty() {
        println!("No persisted runs found in {}", store.root().display());
        return Ok(());
    }

    println!("{:<40} | {:<6} | {:<6} | Query", "Run ID", "Tool", "Count");
    println!("{}", "-".repeat(80));
    for run in runs {
        println!("{:<40} | {:<6} | {:<6} | {}", run.run_id, run.tool, run.count, run.query);
    }
    Ok(())
}

fn cmd_view_run(store: &RunStore, run_id: &str, tool: Option<&str>, request: PageRequest) -> Result<()> {
    debug!(%run_id, ?tool, ?request, "cmd_view_run: called");
    let (record, results) = store.load(run_id)?;
    if let Some(tool) = tool
        && record.tool != tool
    {
        return Err(querystash::StoreError::InvalidArgument(format!(
            "run {} was produced by {}, not {}",
            run_id, record.tool, tool
        ))
        .into());
    }

    print_banner("Result Viewer");
    println!("Run ID:  {}", record.run_id.cyan());
    println!("Tool:    {}", record.tool);
    println!("Query:   {}", record.query);
    println!("Created: {}", record.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"));
    println!("Total:   {}", results.len());
    println!("{}", "-".repeat(24));

    let page = request.apply(&results);
    if request.full {
        println!("Showing ALL results from {}:", page.start + 1);
    } else if page.is_empty() {
        println!("No results at offset {} (total {}).", request.offset, page.total);
    } else {
        println!("Showing results {} to {}:", page.start + 1, page.end);
    }

    for (i, entry) in page.window.iter().enumerate() {
        let n = page.start + i + 1;
        match entry {
            ResultEntry::Path { path } => println!("[{}] {}", n, path),
            ResultEntry::Match {
                path,
                line_number,
                content,
            } => {
                println!("[{}] {}:{}", n, path, line_number);
                println!("    {}", content);
            }
        }
    }

    if let Some(next) = page.next_offset() {
        println!();
        println!("... and {} more.", page.remaining);
        println!("Use `qs view {} --offset {}` to see the next batch.", record.run_id, next);
    }
    Ok(())
}

fn cmd_ls(
    root: PathBuf,
    pattern: String,
    recursive: bool,
    include_dirs: bool,
    date: Option<&str>,
    mode: DateMode,
    json: bool,
) -> Result<()> {
    debug!(?root, %pattern, recursive, include_dirs, ?date, ?mode, json, "cmd_ls: called");
    // Validate before touching the filesystem
    let date = date.map(|d| DateFilter::parse(d, mode)).transpose()?;
    let options = ListOptions {
        pattern,
        recursive,
        include_dirs,
        date,
    };

    let files = list_files(&root, &options)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        for f in files {
            println!("{}", f.path);
        }
    }
    Ok(())
}
