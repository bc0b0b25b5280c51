//! Note repository. Notes hang off chats and tasks through link tables.

use agenthub_common::models::Note;
use sqlx::PgPool;

/// Which link table a note is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOwner {
    Chat,
    Task,
}

impl NoteOwner {
    fn link_table(self) -> (&'static str, &'static str) {
        match self {
            Self::Chat => ("chat_notes", "chat_id"),
            Self::Task => ("task_notes", "task_id"),
        }
    }
}

/// Create a note and link it to its owner in one transaction.
pub async fn create_note(
    pool: &PgPool,
    owner: NoteOwner,
    owner_id: &str,
    id: &str,
    content: &str,
    created_by_user_id: Option<&str>,
) -> Result<Note, sqlx::Error> {
    let (table, column) = owner.link_table();
    let mut tx = pool.begin().await?;
    let note = sqlx::query_as::<_, Note>(
        "INSERT INTO notes (id, content, created_at, created_by_user_id) VALUES ($1, $2, NOW(), $3) RETURNING *",
    )
    .bind(id)
    .bind(content)
    .bind(created_by_user_id)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query(&format!("INSERT INTO {table} ({column}, note_id) VALUES ($1, $2)"))
        .bind(owner_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(note)
}

pub async fn list_notes(pool: &PgPool, owner: NoteOwner, owner_id: &str) -> Result<Vec<Note>, sqlx::Error> {
    let (table, column) = owner.link_table();
    sqlx::query_as::<_, Note>(&format!(
        r#"
        SELECT n.* FROM notes n
        JOIN {table} l ON l.note_id = n.id
        WHERE l.{column} = $1
        ORDER BY n.created_at ASC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

/// Unlink a note and delete it. Returns false when the note was not linked to the owner.
pub async fn delete_linked_note(
    pool: &PgPool,
    owner: NoteOwner,
    owner_id: &str,
    note_id: &str,
) -> Result<bool, sqlx::Error> {
    let (table, column) = owner.link_table();
    let mut tx = pool.begin().await?;
    let unlinked = sqlx::query(&format!("DELETE FROM {table} WHERE {column} = $1 AND note_id = $2"))
        .bind(owner_id)
        .bind(note_id)
        .execute(&mut *tx)
        .await?;
    if unlinked.rows_affected() == 0 {
        return Ok(false);
    }
    sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(note_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(true)
}
