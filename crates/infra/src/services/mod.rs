mod blob_store;
mod holiday_api;
mod notifier;

use crate::Config;
pub use blob_store::{IBlobStore, SignedUrlBlobStore};
pub use holiday_api::{IHolidayProvider, StaticHolidayProvider, TimorHolidayProvider};
pub use notifier::{GoCqNotifier, INotifier, LogNotifier};
use std::sync::Arc;

/// External systems the application talks to
#[derive(Clone)]
pub struct Services {
    pub notifier: Arc<dyn INotifier>,
    pub blob_store: Arc<dyn IBlobStore>,
    pub holiday_provider: Arc<dyn IHolidayProvider>,
}

impl Services {
    pub fn create(config: &Config) -> Self {
        let notifier: Arc<dyn INotifier> = match &config.gocq_uri {
            Some(uri) => Arc::new(GoCqNotifier::new(uri.clone())),
            None => Arc::new(LogNotifier {}),
        };
        Self {
            notifier,
            blob_store: Arc::new(SignedUrlBlobStore::new(
                config.blob_base_url.clone(),
                config.blob_bucket.clone(),
                config.blob_url_expires_secs,
                config.blob_signing_secret.clone(),
            )),
            holiday_provider: Arc::new(TimorHolidayProvider::new(config.holiday_api_url.clone())),
        }
    }

    /// Services that never leave the process, used for testing
    pub fn create_inmemory(config: &Config) -> Self {
        Self {
            notifier: Arc::new(LogNotifier {}),
            blob_store: Arc::new(SignedUrlBlobStore::new(
                config.blob_base_url.clone(),
                config.blob_bucket.clone(),
                config.blob_url_expires_secs,
                config.blob_signing_secret.clone(),
            )),
            holiday_provider: Arc::new(StaticHolidayProvider::empty()),
        }
    }
}
