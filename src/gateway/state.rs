use std::sync::Arc;

use crate::account::AccountStore;
use crate::transfer::TransferEngine;

/// Gateway shared state
pub struct AppState<S: AccountStore> {
    /// Transfer engine over the configured account store
    pub engine: Arc<TransferEngine<S>>,
}

impl<S: AccountStore> AppState<S> {
    pub fn new(engine: Arc<TransferEngine<S>>) -> Self {
        Self { engine }
    }
}

impl<S: AccountStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}
