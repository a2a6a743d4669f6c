//! Task persistence. All operations are scoped to the owning user.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    #[serde(skip_serializing)]
    pub owner_id: i64,
}

/// Partial update: absent fields retain their prior value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        completed: row.get("completed")?,
        owner_id: row.get("owner_id")?,
    })
}

pub fn create(conn: &Connection, owner_id: i64, title: &str) -> ApiResult<Task> {
    conn.execute(
        "INSERT INTO tasks (title, completed, owner_id) VALUES (?1, 0, ?2)",
        params![title, owner_id],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, owner_id, id)?.ok_or_else(|| ApiError::internal("task row missing after insert"))
}

pub fn get(conn: &Connection, owner_id: i64, id: i64) -> ApiResult<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT id, title, completed, owner_id FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
            from_row,
        )
        .optional()?;
    Ok(task)
}

/// All tasks owned by the user. No ordering guarantee.
pub fn list_by_owner(conn: &Connection, owner_id: i64) -> ApiResult<Vec<Task>> {
    let mut stmt =
        conn.prepare("SELECT id, title, completed, owner_id FROM tasks WHERE owner_id = ?1")?;
    let rows = stmt.query_map([owner_id], from_row)?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    Ok(tasks)
}

pub fn update(conn: &Connection, owner_id: i64, id: i64, patch: &TaskPatch) -> ApiResult<Task> {
    let Some(current) = get(conn, owner_id, id)? else {
        return Err(ApiError::not_found("Task not found"));
    };
    let title = patch.title.clone().unwrap_or(current.title);
    let completed = patch.completed.unwrap_or(current.completed);
    conn.execute(
        "UPDATE tasks SET title = ?1, completed = ?2 WHERE id = ?3 AND owner_id = ?4",
        params![title, completed, id, owner_id],
    )?;
    get(conn, owner_id, id)?.ok_or_else(|| ApiError::not_found("Task not found"))
}

pub fn delete(conn: &Connection, owner_id: i64, id: i64) -> ApiResult<()> {
    let changed =
        conn.execute("DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2", params![id, owner_id])?;
    if changed == 0 {
        return Err(ApiError::not_found("Task not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SharedDb;
    use crate::security;

    fn seeded_db() -> (SharedDb, i64, i64) {
        let db = SharedDb::open_in_memory().unwrap();
        let (alice, bob) = {
            let conn = db.0.lock();
            (
                security::register(&conn, "alice", "pw1").unwrap(),
                security::register(&conn, "bob", "pw2").unwrap(),
            )
        };
        (db, alice, bob)
    }

    #[test]
    fn create_defaults_to_not_completed() {
        let (db, alice, _) = seeded_db();
        let conn = db.0.lock();
        let task = create(&conn, alice, "buy milk").unwrap();
        assert_eq!(task.title, "buy milk");
        assert!(!task.completed);
        assert_eq!(task.owner_id, alice);
    }

    #[test]
    fn list_is_scoped_to_owner() {
        let (db, alice, bob) = seeded_db();
        let conn = db.0.lock();
        create(&conn, alice, "alice task").unwrap();
        create(&conn, bob, "bob task").unwrap();
        let tasks = list_by_owner(&conn, alice).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "alice task");
    }

    #[test]
    fn update_applies_only_present_fields() {
        let (db, alice, _) = seeded_db();
        let conn = db.0.lock();
        let task = create(&conn, alice, "buy milk").unwrap();

        let updated = update(
            &conn,
            alice,
            task.id,
            &TaskPatch { title: None, completed: Some(true) },
        )
        .unwrap();
        assert_eq!(updated.title, "buy milk");
        assert!(updated.completed);

        // Empty patch leaves everything untouched.
        let unchanged = update(&conn, alice, task.id, &TaskPatch::default()).unwrap();
        assert_eq!(unchanged, updated);
    }

    #[test]
    fn foreign_owner_sees_not_found() {
        let (db, alice, bob) = seeded_db();
        let conn = db.0.lock();
        let task = create(&conn, alice, "private").unwrap();

        let err = update(&conn, bob, task.id, &TaskPatch::default()).unwrap_err();
        assert_eq!(err, ApiError::not_found("Task not found"));
        let err = delete(&conn, bob, task.id).unwrap_err();
        assert_eq!(err, ApiError::not_found("Task not found"));
        // Still there for the real owner.
        assert!(get(&conn, alice, task.id).unwrap().is_some());
    }

    #[test]
    fn delete_is_permanent() {
        let (db, alice, _) = seeded_db();
        let conn = db.0.lock();
        let task = create(&conn, alice, "gone soon").unwrap();
        delete(&conn, alice, task.id).unwrap();
        assert!(get(&conn, alice, task.id).unwrap().is_none());
        assert_eq!(
            delete(&conn, alice, task.id).unwrap_err(),
            ApiError::not_found("Task not found")
        );
    }
}
