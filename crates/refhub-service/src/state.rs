//! Application state.

use std::sync::Arc;

use refhub_engine::{
    EmploymentDirectory, ExpirationSweeper, Notifier, ReferralEngine,
};
use refhub_store::Store;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The referral engine.
    pub engine: Arc<ReferralEngine>,

    /// The expiration sweeper (admin runs and the scheduled task).
    pub sweeper: Arc<ExpirationSweeper>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Wire the engine and sweeper over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        directory: Arc<dyn EmploymentDirectory>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
    ) -> Self {
        let engine = Arc::new(ReferralEngine::new(
            Arc::clone(&store),
            directory,
            notifier,
        ));
        let sweeper = Arc::new(ExpirationSweeper::new(Arc::clone(&engine), store));
        Self {
            engine,
            sweeper,
            config,
        }
    }
}
