use adminbit::*;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppConfig::new("config/settings")?;

    let registry = match cfg.schema {
        Some(schema) => {
            schema.validate()?;
            Arc::new(schema)
        }
        None => Arc::new(SchemaRegistry::builtin()),
    };
    let store: Arc<dyn DataStore> = if cfg.store.seed {
        Arc::new(MemoryStore::seeded(cfg.store.latency))
    } else {
        Arc::new(MemoryStore::new(cfg.store.latency))
    };
    let sessions = Arc::new(SessionManager::new(cfg.auth));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let state = RequestState { registry, store, sessions, notifier };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    if cfg.http.enable {
        info!("Starting http server at {}", cfg.http.bind_address);
        serve(state, cfg.http.bind_address, None, None, shutdown_rx).await?;
    }
    Ok(())
}
