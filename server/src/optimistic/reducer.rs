//! Optimistic todo state
//!
//! Every user operation is a pair: an optimistic action applied before the
//! server answers, then either a finish action (server succeeded) or a
//! cancel action carrying the values to restore.

use crate::database::{Attachment, TodoPage};
use serde::{Deserialize, Serialize};

/// Id of a row created locally and not yet acknowledged by the server
pub const GHOST_ID: i64 = -1;

/// A todo as shown in the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimisticTodo {
    #[serde(flatten)]
    pub todo: TodoPage,
    /// A server call for this row is in flight
    pub pending: bool,
}

impl OptimisticTodo {
    pub fn settled(todo: TodoPage) -> Self {
        Self {
            todo,
            pending: false,
        }
    }

    pub fn ghost(content: String) -> Self {
        Self {
            todo: TodoPage {
                id: GHOST_ID,
                content,
                attachment: None,
                tags: Vec::new(),
            },
            pending: true,
        }
    }

    pub fn id(&self) -> i64 {
        self.todo.id
    }

    pub fn is_ghost(&self) -> bool {
        self.todo.id == GHOST_ID
    }
}

impl From<TodoPage> for OptimisticTodo {
    fn from(todo: TodoPage) -> Self {
        Self::settled(todo)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoAction {
    OptimisticAdd { content: String },
    FinishAdd { todo: TodoPage },
    CancelAdd,

    OptimisticEdit { id: i64, content: String },
    FinishEdit { id: i64 },
    CancelEdit { id: i64, content: String },

    OptimisticDelete { id: i64 },
    FinishDelete { id: i64 },
    CancelDelete { id: i64 },

    OptimisticUpload { id: i64 },
    FinishUpload { id: i64, attachment: Option<Attachment> },
    CancelUpload { id: i64 },

    OptimisticAssetDelete { id: i64 },
    FinishAssetDelete { id: i64 },
    CancelAssetDelete { id: i64, attachment: Option<Attachment> },

    OptimisticTagEdit { id: i64, tags: Vec<String> },
    FinishTagEdit { id: i64 },
    CancelTagEdit { id: i64, tags: Vec<String> },
}

/// Apply `f` to the row with `id`; unknown ids are ignored
fn update(
    mut state: Vec<OptimisticTodo>,
    id: i64,
    f: impl FnOnce(&mut OptimisticTodo),
) -> Vec<OptimisticTodo> {
    if let Some(row) = state.iter_mut().find(|row| row.id() == id) {
        f(row);
    }
    state
}

/// Next state for `action`
pub fn reduce(mut state: Vec<OptimisticTodo>, action: TodoAction) -> Vec<OptimisticTodo> {
    use TodoAction::*;

    match action {
        OptimisticAdd { content } => {
            state.push(OptimisticTodo::ghost(content));
            state
        }
        FinishAdd { todo } => {
            match state.iter().position(OptimisticTodo::is_ghost) {
                Some(index) => state[index] = OptimisticTodo::settled(todo),
                None => state.push(OptimisticTodo::settled(todo)),
            }
            state
        }
        CancelAdd => {
            if let Some(index) = state.iter().position(OptimisticTodo::is_ghost) {
                state.remove(index);
            }
            state
        }

        OptimisticEdit { id, content } => update(state, id, |row| {
            row.todo.content = content;
            row.pending = true;
        }),
        CancelEdit { id, content } => update(state, id, |row| {
            row.todo.content = content;
            row.pending = false;
        }),

        OptimisticDelete { id } | OptimisticUpload { id } => {
            update(state, id, |row| row.pending = true)
        }
        FinishDelete { id } => {
            state.retain(|row| row.id() != id);
            state
        }

        FinishUpload { id, attachment } => update(state, id, |row| {
            row.todo.attachment = attachment;
            row.pending = false;
        }),

        OptimisticAssetDelete { id } => update(state, id, |row| {
            row.todo.attachment = None;
            row.pending = true;
        }),
        CancelAssetDelete { id, attachment } => update(state, id, |row| {
            row.todo.attachment = attachment;
            row.pending = false;
        }),

        OptimisticTagEdit { id, tags } => update(state, id, |row| {
            row.todo.tags = tags;
            row.pending = true;
        }),
        CancelTagEdit { id, tags } => update(state, id, |row| {
            row.todo.tags = tags;
            row.pending = false;
        }),

        FinishEdit { id }
        | CancelDelete { id }
        | CancelUpload { id }
        | FinishAssetDelete { id }
        | FinishTagEdit { id } => update(state, id, |row| row.pending = false),
    }
}
