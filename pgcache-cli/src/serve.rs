//! Line-delimited JSON hook loop on stdio.
//!
//! The host writes one JSON object per line — `{"hook": "...", "attrs":
//! {...}}` — and reads one reply object per line. stdout carries only
//! protocol; logging goes to stderr and the log file.

use pgcache::attrs::Attrs;
use pgcache::plugin::Plugin;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serves hook calls until stdin closes or ctrl-c arrives.
pub async fn run_hook_loop(plugin: Arc<Plugin>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("host closed the hook stream");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = dispatch(&plugin, &line).await;
                stdout.write_all(reply.to_string().as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
    }
    Ok(())
}

/// Routes one hook call to the plugin and wraps the reply.
async fn dispatch(plugin: &Plugin, line: &str) -> Value {
    let call: Value = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(err) => {
            debug!(%err, "malformed hook call");
            return json!({"error": format!("malformed hook call: {err}")});
        }
    };

    let hook = call["hook"].as_str().unwrap_or_default().to_string();
    let attrs = Attrs::from_value(call["attrs"].clone()).unwrap_or_default();

    match hook.as_str() {
        "getPluginConfig" => Plugin::manifest(),
        "onTrafficFromClient" => plugin.on_traffic_from_client(attrs).await.into_value(),
        "onTrafficFromServer" => plugin.on_traffic_from_server(attrs).await.into_value(),
        "onClosed" => plugin.on_closed(attrs).await.into_value(),
        other => {
            debug!(hook = other, "unknown hook");
            json!({"error": format!("unknown hook '{other}'")})
        }
    }
}
