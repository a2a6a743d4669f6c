//! Note persistence. All operations are scoped to the owning user.
//!
//! A note may reference a task via `task_id`. The reference is only checked
//! against task ownership in `link_to_task`; create and update accept the
//! value as given, so a dangling or foreign task id is persisted verbatim.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::storage::tasks;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub task_id: Option<i64>,
    #[serde(skip_serializing)]
    pub owner_id: i64,
}

/// Partial update: absent fields retain their prior value. `task_id`
/// distinguishes "absent" (keep) from "null" (clear the link), hence the
/// nested Option.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub content: Option<String>,
    pub task_id: Option<Option<i64>>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        content: row.get("content")?,
        task_id: row.get("task_id")?,
        owner_id: row.get("owner_id")?,
    })
}

pub fn create(
    conn: &Connection,
    owner_id: i64,
    content: &str,
    task_id: Option<i64>,
) -> ApiResult<Note> {
    conn.execute(
        "INSERT INTO notes (content, task_id, owner_id) VALUES (?1, ?2, ?3)",
        params![content, task_id, owner_id],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, owner_id, id)?.ok_or_else(|| ApiError::internal("note row missing after insert"))
}

pub fn get(conn: &Connection, owner_id: i64, id: i64) -> ApiResult<Option<Note>> {
    let note = conn
        .query_row(
            "SELECT id, content, task_id, owner_id FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
            from_row,
        )
        .optional()?;
    Ok(note)
}

/// All notes owned by the user. No ordering guarantee.
pub fn list_by_owner(conn: &Connection, owner_id: i64) -> ApiResult<Vec<Note>> {
    let mut stmt =
        conn.prepare("SELECT id, content, task_id, owner_id FROM notes WHERE owner_id = ?1")?;
    let rows = stmt.query_map([owner_id], from_row)?;
    let mut notes = Vec::new();
    for row in rows {
        notes.push(row?);
    }
    Ok(notes)
}

pub fn update(conn: &Connection, owner_id: i64, id: i64, patch: &NotePatch) -> ApiResult<Note> {
    let Some(current) = get(conn, owner_id, id)? else {
        return Err(ApiError::not_found("Note not found"));
    };
    let content = patch.content.clone().unwrap_or(current.content);
    let task_id = match patch.task_id {
        Some(value) => value,
        None => current.task_id,
    };
    conn.execute(
        "UPDATE notes SET content = ?1, task_id = ?2 WHERE id = ?3 AND owner_id = ?4",
        params![content, task_id, id, owner_id],
    )?;
    get(conn, owner_id, id)?.ok_or_else(|| ApiError::not_found("Note not found"))
}

pub fn delete(conn: &Connection, owner_id: i64, id: i64) -> ApiResult<()> {
    let changed =
        conn.execute("DELETE FROM notes WHERE id = ?1 AND owner_id = ?2", params![id, owner_id])?;
    if changed == 0 {
        return Err(ApiError::not_found("Note not found"));
    }
    Ok(())
}

/// Notes the user owns that reference the given task id. The task itself is
/// not checked; a foreign or unknown task id simply yields an empty list.
pub fn list_for_task(conn: &Connection, owner_id: i64, task_id: i64) -> ApiResult<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, content, task_id, owner_id FROM notes WHERE task_id = ?1 AND owner_id = ?2",
    )?;
    let rows = stmt.query_map(params![task_id, owner_id], from_row)?;
    let mut notes = Vec::new();
    for row in rows {
        notes.push(row?);
    }
    Ok(notes)
}

/// Attaches an existing note to an existing task. Both lookups are scoped to
/// the owner, so this is the one place cross-entity ownership is enforced.
pub fn link_to_task(
    conn: &Connection,
    owner_id: i64,
    task_id: i64,
    note_id: i64,
) -> ApiResult<Note> {
    let task = tasks::get(conn, owner_id, task_id)?;
    let note = get(conn, owner_id, note_id)?;
    let (Some(task), Some(note)) = (task, note) else {
        return Err(ApiError::not_found("Task or Note not found"));
    };
    conn.execute(
        "UPDATE notes SET task_id = ?1 WHERE id = ?2 AND owner_id = ?3",
        params![task.id, note.id, owner_id],
    )?;
    get(conn, owner_id, note.id)?.ok_or_else(|| ApiError::not_found("Note not found"))
}
