mod connection;

use std::{env, io, sync::Arc};

use coordinator::{
    CoordinatorBuilder, CoordinatorConfig,
    events::BroadcastSink,
    ledger::{Ledger, MemoryLedger, SledLedger},
};
use log::{info, warn};
use tokio::{net::TcpListener, signal};

use crate::connection::Connection;

const DEFAULT_HOST: &str = "127.0.0.1";

/// How many events a slow subscriber may lag behind before it starts losing them.
const EVENT_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = match env::var("COORDINATOR_CONFIG") {
        Ok(path) => {
            info!("loading config from {path}");
            CoordinatorConfig::load(path)?
        }
        Err(_) => CoordinatorConfig::default(),
    };

    let ledger: Arc<dyn Ledger> = match env::var("LEDGER_PATH") {
        Ok(path) => {
            info!("persisting results to {path}");
            Arc::new(SledLedger::open(&path).map_err(io::Error::other)?)
        }
        Err(_) => {
            warn!("LEDGER_PATH unset, results won't survive a restart");
            Arc::new(MemoryLedger::new())
        }
    };

    let sink = BroadcastSink::new(EVENT_CAPACITY);
    let coordinator = CoordinatorBuilder::new(config)
        .ledger(ledger)
        .build(sink.clone())?;
    let coordinator = Arc::new(coordinator);

    let addr = format!(
        "{}:{}",
        env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        env::var("PORT").map_err(io::Error::other)?,
    );

    let listener = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("failed to accept a connection: {e}");
                        continue;
                    }
                };

                info!("participant connected from {peer}");
                let (rx, tx) = stream.into_split();
                let conn = Connection::new(coordinator.clone(), sink.clone());

                tokio::spawn(async move {
                    match conn.serve(rx, tx).await {
                        Ok(()) => info!("participant {peer} disconnected"),
                        Err(e) => warn!("connection with {peer} failed: {e}"),
                    }
                });
            }
            _ = signal::ctrl_c() => {
                info!("received SIGTERM");
                break;
            }
        }
    }

    Ok(())
}
