use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use rollbookd::config::{AppConfig, Backend};
use rollbookd::ipc;
use rollbookd::logging;
use rollbookd::service::{AuthSession, HttpRecordService, MemoryRecordService, RecordService};

fn build_service(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordService>> {
    match config.backend {
        Backend::Http => {
            let http = config
                .http
                .as_ref()
                .ok_or_else(|| anyhow!("backend is http but no http section is configured"))?;
            let service = HttpRecordService::new(
                http.base_url.as_str(),
                AuthSession::new(http.token.as_str()),
                Duration::from_secs(http.timeout_secs),
            )?;
            Ok(Arc::new(service))
        }
        Backend::Fixture => {
            let fixture = config
                .fixture
                .as_ref()
                .ok_or_else(|| anyhow!("backend is fixture but no fixture section is configured"))?;
            let service = MemoryRecordService::from_fixture(&fixture.path)
                .with_context(|| format!("loading fixture {}", fixture.path.display()))?;
            Ok(Arc::new(service))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = AppConfig::load()?;
    let service = build_service(&config)?;
    info!(backend = ?config.backend, "record service ready");
    let mut state = ipc::AppState::new(service);

    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with an id we never parsed.
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                write_line(&mut stdout, &reply).await;
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req).await;
        write_line(&mut stdout, &resp).await;
    }
    Ok(())
}

async fn write_line(stdout: &mut io::Stdout, value: &serde_json::Value) {
    let line = serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    let _ = stdout.write_all(line.as_bytes()).await;
    let _ = stdout.write_all(b"\n").await;
    let _ = stdout.flush().await;
}
