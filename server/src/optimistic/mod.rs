//! Optimistic view-model
//!
//! Front-end state for the todo list:
//! - `reducer`: the pure state machine over [`TodoAction`]
//! - `filter`: tag and content filtering of the list
//! - `backend`: server actions the loop awaits
//! - `reconciler`: optimistic action, server call, then finish or cancel

pub mod backend;
pub mod filter;
pub mod reconciler;
pub mod reducer;

pub use backend::{LocalBackend, TodoBackend};
pub use filter::{available_tags, TodoFilter};
pub use reconciler::Reconciler;
pub use reducer::{reduce, OptimisticTodo, TodoAction, GHOST_ID};
