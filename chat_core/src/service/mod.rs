pub mod messages;
pub mod topics;

pub use messages::{MessageScope, MessagesService, MessagesServiceError};
pub use topics::{TopicsService, TopicsServiceError};
