mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::*;
pub use services::*;
use std::sync::Arc;
pub use system::{ControlledSys, ISys, RealSys};

#[derive(Clone)]
pub struct TodoReminderContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub services: Services,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl TodoReminderContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let services = Services::create(&config);
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            services,
        }
    }

    /// Context with inmemory repositories and services that never leave the process
    pub fn create_inmemory() -> Self {
        let config = Config::new();
        let services = Services::create_inmemory(&config);
        Self {
            repos: Repos::create_inmemory(),
            config,
            sys: Arc::new(RealSys {}),
            services,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> TodoReminderContext {
    TodoReminderContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}
