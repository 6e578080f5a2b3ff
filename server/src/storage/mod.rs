//! Storage module
//!
//! Provides on-disk storage for todo attachments.

pub mod attachment_store;

pub use attachment_store::AttachmentStore;
