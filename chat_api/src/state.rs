use chat_core::service::{MessagesService, TopicsService};
use chat_core::ChatCore;

/// Shared by every handler. Services are cheap to clone; they only hold the
/// connection pool.
#[derive(Clone)]
pub struct AppState {
    pub topics: TopicsService,
    pub messages: MessagesService,
}

impl From<&ChatCore> for AppState {
    fn from(core: &ChatCore) -> Self {
        Self {
            topics: core.topics.clone(),
            messages: core.messages.clone(),
        }
    }
}
