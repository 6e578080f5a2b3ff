//! Services module
//!
//! Business logic services that coordinate between commands, the
//! repository and the attachment store.

pub mod attachments;
pub mod auth;
pub mod todos;

pub use attachments::AttachmentsService;
pub use auth::{AuthService, IssuedSession};
pub use todos::TodosService;
