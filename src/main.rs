mod calc;
mod db;
mod grades;
mod guardians;
mod ipc;
mod kv;
mod notifications;
mod prefs;
mod report;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Local sidecar for the Classter evaluation app. Reads one JSON request per
/// line on stdin and answers one JSON line per request on stdout.
#[derive(Parser, Debug)]
#[command(version)]
struct CliArgs {
    /// Workspace directory to open at startup.
    #[arg(long, env = "CLASSTERD_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Scope the notification store to this user.
    #[arg(long)]
    user_id: Option<i64>,
}

fn main() {
    let args = CliArgs::parse();

    // stdout carries IPC responses, so logs go to stderr.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init();

    let mut state = ipc::AppState::new();
    if let Some(path) = args.workspace.as_ref() {
        if let Err(e) = state.open_workspace(path, args.user_id) {
            error!(error = ?e, "failed to open startup workspace");
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "classterd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
