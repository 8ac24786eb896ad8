//! HTTP command surface over the registry and the rotation simulator.

use std::io;
use std::sync::Arc;

use tracing::info;

use crate::battle::RotationLimits;
use crate::config::Config;
use crate::registry::{JsonFileStore, Registry};

pub mod api;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub limits: RotationLimits,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let store = JsonFileStore::new(config.data_file.clone(), config.corrupt_state);
        Self {
            registry: Arc::new(Registry::new(Arc::new(store))),
            limits: config.rotation_limits(),
        }
    }
}

pub fn run_server(config: &Config) -> io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))
}

async fn serve(config: &Config) -> io::Result<()> {
    let app = routes::router(AppState::from_config(config));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        data_file = %config.data_file.display(),
        "shinobi server listening"
    );
    axum::serve(listener, app).await
}
