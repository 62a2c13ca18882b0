use anyhow::Context;
use clap::Parser;
use rosterd::{config, ipc};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Student-record sidecar: one JSON request per stdin line, one JSON
/// response per stdout line.
#[derive(Parser)]
#[command(name = "rosterd", version)]
struct Cli {
    /// Open this workspace directory before reading requests
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Path to a TOML config file (defaults to ./rosterd.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries responses; logs go to stderr.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let cfg = config::load_config(cli.config.as_deref()).context("failed to load config")?;
    let mut state = ipc::AppState::new(cfg.manager_options(), cfg.busy_timeout());

    if let Some(path) = cli.workspace.or_else(|| cfg.workspace_path()) {
        let mut host = ipc::RequestHost::default();
        if let Err(e) = ipc::select_workspace(&mut state, path.clone(), &mut host) {
            // Data requests will keep reporting the failure; the loop still runs.
            tracing::error!(workspace = %path.display(), error = %e, "startup workspace failed");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}
