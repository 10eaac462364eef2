pub mod errors;
pub mod server;

use crate::webhook::messenger::{dispatch::DispatchTable, handler::WebhookSettings};
use std::sync::Arc;

/// State shared by every server worker. Both members are read only.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<DispatchTable>,
    pub settings: Arc<WebhookSettings>,
}
