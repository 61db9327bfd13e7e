//! Vortex Daemon - background market-analysis service
//!
//! Serves one long-lived engine over line-delimited JSON on localhost TCP:
//! - `Analyze` runs a full invocation over a market snapshot
//! - `StatusGet` / `ImprovementGet` return read-only snapshots
//! - `ImprovementStop` / `ImprovementResume` toggle self-improvement
//! - `Shutdown` persists the engine image and exits
//!
//! The engine sits behind one exclusive lock held for a full invocation;
//! concurrent clients serialize on it.
//!
//! Storage locations:
//! - Linux: ~/.local/share/vortex/
//! - Windows: %APPDATA%\vortex\
//! - MacOS: ~/Library/Application Support/vortex/

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tracing::{error, info, warn};

use vortex::analysis::{Analysis, ImprovementStatus, Status};
use vortex::engine::{Engine, EngineConfig};
use vortex::market::AssetRecord;
use vortex::storage;

mod paths;

use paths::AppPaths;

const BIND_ADDR: &str = "127.0.0.1:9317";

#[derive(Debug, Error)]
enum DaemonError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine data directory")]
    DataDir,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Request {
    /// Run one full analysis over a market snapshot.
    Analyze {
        #[serde(default)]
        records: Vec<AssetRecord>,
    },

    // Read-only snapshots
    StatusGet,
    ImprovementGet,

    // Self-improvement control
    ImprovementStop,
    ImprovementResume,

    /// Persist the engine image and exit.
    Shutdown,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Response {
    Analysis { analysis: Analysis },
    Status { status: Status },
    Improvement { improvement: ImprovementStatus },
    Ack,
    Error { message: String },
}

fn load_or_create_engine(path: &Path) -> Engine {
    match std::fs::File::open(path) {
        Ok(mut file) => match storage::load_image(&mut file) {
            Ok(engine) => {
                info!(path = %path.display(), "engine image loaded");
                engine
            }
            Err(e) => {
                warn!(error = %e, "engine image unreadable, starting fresh");
                Engine::new(EngineConfig::default())
            }
        },
        Err(_) => {
            info!("no engine image found, starting fresh");
            Engine::new(EngineConfig::default())
        }
    }
}

fn save_engine(engine: &Engine, path: &Path) -> Result<(), DaemonError> {
    // Write-then-rename so a crash mid-save cannot clobber the last image.
    let tmp = path.with_extension("vxi.tmp");
    let mut file = std::fs::File::create(&tmp)?;
    storage::save_image(engine, &mut file)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

async fn handle_client(
    stream: TcpStream,
    engine: Arc<Mutex<Engine>>,
    shutdown: Arc<Notify>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let request: Request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let resp = Response::Error {
                    message: format!("invalid request: {e}"),
                };
                writer
                    .write_all(serde_json::to_string(&resp)?.as_bytes())
                    .await?;
                writer.write_all(b"\n").await?;
                continue;
            }
        };

        let shutdown_after = matches!(request, Request::Shutdown);
        let response = {
            // One invocation holds the engine lock end to end.
            let mut engine = engine.lock().await;
            match request {
                Request::Analyze { records } => Response::Analysis {
                    analysis: engine.process(&records),
                },
                Request::StatusGet => Response::Status {
                    status: engine.status(),
                },
                Request::ImprovementGet => Response::Improvement {
                    improvement: engine.improvement_status(),
                },
                Request::ImprovementStop => {
                    engine.stop_self_improvement();
                    Response::Ack
                }
                Request::ImprovementResume => {
                    engine.resume_self_improvement();
                    Response::Ack
                }
                Request::Shutdown => Response::Ack,
            }
        };

        writer
            .write_all(serde_json::to_string(&response)?.as_bytes())
            .await?;
        writer.write_all(b"\n").await?;

        if shutdown_after {
            shutdown.notify_one();
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let paths = AppPaths::new()?;
    let image_path = paths.engine_file();

    let engine = Arc::new(Mutex::new(load_or_create_engine(&image_path)));
    let shutdown = Arc::new(Notify::new());

    let listener = TcpListener::bind(BIND_ADDR).await?;
    info!(addr = BIND_ADDR, "vortexd listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                info!(%peer, "client connected");
                let engine = Arc::clone(&engine);
                let shutdown = Arc::clone(&shutdown);
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, engine, shutdown).await {
                        error!(error = %e, "client session failed");
                    }
                });
            }
            _ = shutdown.notified() => {
                info!("shutdown requested");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    let engine = engine.lock().await;
    match save_engine(&engine, &image_path) {
        Ok(()) => info!(path = %image_path.display(), "engine image saved"),
        Err(e) => error!(error = %e, "failed to save engine image"),
    }

    Ok(())
}
