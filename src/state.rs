// src/state.rs
use std::sync::Arc;

use crate::services::completion::CompletionClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub completions: Arc<dyn CompletionClient>,
}

impl AppState {
    pub fn new(completions: Arc<dyn CompletionClient>) -> Self {
        Self { completions }
    }

    pub fn shared(completions: Arc<dyn CompletionClient>) -> SharedState {
        Arc::new(Self::new(completions))
    }
}
