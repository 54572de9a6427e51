use std::sync::Arc;

use anyhow::Result;

use super::auth::TokenGate;
use crate::config::Config;
use crate::predict::PredictionClient;
use crate::storage::{AnalysisStore, BreachStore, Pool};

#[derive(Clone)]
pub struct AppState {
    pub breaches: BreachStore,
    pub analyses: AnalysisStore,
    pub predictor: PredictionClient,
    pub gate: Arc<TokenGate>,
    /// Default ranking length for trend endpoints.
    pub top_n: usize,
    pub permissive_cors: bool,
}

impl AppState {
    pub fn new(pool: Pool, config: &Config) -> Result<Self> {
        Ok(Self {
            breaches: BreachStore::new(pool.clone()),
            analyses: AnalysisStore::new(pool),
            predictor: PredictionClient::new(&config.predictor)?,
            gate: Arc::new(TokenGate::from_config(&config.auth)),
            top_n: config.reporting.top_n,
            permissive_cors: config.server.permissive_cors,
        })
    }
}
