//! Startup sequence: storage, then administrator identity, then the listener.
//! A stage runs only after the previous one succeeded.

use std::future::Future;
use tracing::error;

use crate::config::Config;
use crate::db::sqlite::AdminStorage;
use crate::error::StartupError;
use crate::lifecycle::Lifecycle;
use crate::server::listener;
use crate::server::router::{NotebookState, notebook_router};
use crate::service::bootstrap::{self, SeedOutcome};
use crate::service::storage_init;

/// Storage and identity, ready for the listener.
pub struct Prepared {
    pub storage: AdminStorage,
    pub seed: SeedOutcome,
}

/// Run the storage initializer and the administrator seeder.
pub async fn prepare(cfg: &Config, lifecycle: &Lifecycle) -> Result<Prepared, StartupError> {
    let storage = storage_init::initialize(cfg).await?;
    lifecycle.advance();

    let seed = match bootstrap::seed_admin(&storage, cfg).await {
        Ok(seed) => seed,
        Err(e) => {
            storage.close().await;
            return Err(e);
        }
    };
    lifecycle.advance();

    Ok(Prepared { storage, seed })
}

/// Full startup and serve loop. Returns once `shutdown` resolves and the
/// server has drained, or with the first fatal error. On error the lifecycle
/// ends in `Failed`.
pub async fn run<F>(
    cfg: &Config,
    lifecycle: &Lifecycle,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let result = run_stages(cfg, lifecycle, shutdown).await;
    if let Err(err) = &result {
        lifecycle.fail();
        error!(stage = err.stage(), error = %err, "startup aborted");
    }
    result
}

async fn run_stages<F>(
    cfg: &Config,
    lifecycle: &Lifecycle,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let Prepared { storage, .. } = prepare(cfg, lifecycle).await?;

    let tcp = match listener::bind(cfg).await {
        Ok(tcp) => tcp,
        Err(e) => {
            storage.close().await;
            return Err(e);
        }
    };

    let state = NotebookState::new(storage.clone(), lifecycle.subscribe());
    let app = notebook_router(state, &cfg.upload_dir);
    lifecycle.advance();

    let served = listener::serve(tcp, app, shutdown).await;
    storage.close().await;
    served
}
