use std::process::ExitCode;
use std::sync::Arc;

use models::ObjectType;
use service::storage::{BlobStorageService, InMemoryObjectStore, StorageService};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // config.toml is optional, but a present file must parse and validate
    let (config, from_file) = match configs::AppConfig::load_or_default() {
        Ok(loaded) => loaded,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "store", event = "config_invalid", error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(config.logging.json);
    if !from_file {
        warn!(service = "store", event = "config_defaults", "no config file found, using defaults");
    }

    std::panic::set_hook(Box::new(|info| {
        error!(service = "store", event = "panic", message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "store", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "store",
        event = "start",
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        bucket = %config.storage.bucket,
        root = %config.storage.root_folder,
        "document store starting"
    );

    rt.block_on(async move {
        let backend = Arc::new(InMemoryObjectStore::new(config.storage.bucket.clone()));
        let store = match BlobStorageService::new(backend, &config) {
            Ok(store) => store,
            Err(e) => {
                error!(service = "store", event = "init_failed", error = %e, "failed to build storage service");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = store.ensure_store_exists().await {
            error!(service = "store", event = "provision_failed", error = %e, "failed to provision bucket");
            return ExitCode::FAILURE;
        }

        let mut ticker = tokio::time::interval(store.health_interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => poll_markers(&store).await,
                _ = tokio::signal::ctrl_c() => {
                    info!(service = "store", event = "shutdown_signal", "received Ctrl+C, draining marker refreshes");
                    break;
                }
            }
        }
        store.shutdown().await;
        info!(service = "store", event = "stop", "document store stopped");
        ExitCode::SUCCESS
    })
}

/// Log the freshness marker of every type; missing markers get created on the way.
async fn poll_markers(store: &BlobStorageService) {
    for object_type in ObjectType::ALL {
        match store.last_modified(object_type).await {
            Ok(last_modified) => {
                info!(service = "store", event = "freshness", %object_type, last_modified, "marker polled")
            }
            Err(e) => warn!(service = "store", event = "freshness_failed", %object_type, error = %e, "marker poll failed"),
        }
    }
}
