//! Resource store: owner-scoped Task and Note persistence.
//!
//! Every read/update/delete is filtered by both entity id and owning user
//! id, so the lookup doubles as the authorization gate: another user's id
//! yields `NotFound`, never `Forbidden`.

pub mod notes;
pub mod tasks;

pub use notes::{Note, NotePatch};
pub use tasks::{Task, TaskPatch};
