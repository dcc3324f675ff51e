use crate::{config::Config, provider::Dispatcher, secrets};
use std::sync::Arc;

/// Process-wide state; built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub secrets: Arc<dyn secrets::SecretStore>,
    pub dispatcher: Dispatcher,
}
