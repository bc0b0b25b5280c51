//! Document repository. Documents hang off chats and tasks through link tables.

use agenthub_common::models::Document;
use sqlx::PgPool;

/// Which link table a document is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOwner {
    Chat,
    Task,
}

impl DocumentOwner {
    fn link_table(self) -> (&'static str, &'static str) {
        match self {
            Self::Chat => ("chat_documents", "chat_id"),
            Self::Task => ("task_documents", "task_id"),
        }
    }
}

/// Record a document and link it to its owner in one transaction.
#[allow(clippy::too_many_arguments)]
pub async fn attach_document(
    pool: &PgPool,
    owner: DocumentOwner,
    owner_id: &str,
    id: &str,
    file_url: &str,
    file_name: &str,
    mime_type: &str,
    uploaded_by_user_id: Option<&str>,
) -> Result<Document, sqlx::Error> {
    let (table, column) = owner.link_table();
    let mut tx = pool.begin().await?;
    let document = sqlx::query_as::<_, Document>(
        r#"
        INSERT INTO documents (id, file_url, file_name, mime_type, uploaded_at, uploaded_by_user_id)
        VALUES ($1, $2, $3, $4, NOW(), $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(file_url)
    .bind(file_name)
    .bind(mime_type)
    .bind(uploaded_by_user_id)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query(&format!("INSERT INTO {table} ({column}, document_id) VALUES ($1, $2)"))
        .bind(owner_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(document)
}

pub async fn list_documents(
    pool: &PgPool,
    owner: DocumentOwner,
    owner_id: &str,
) -> Result<Vec<Document>, sqlx::Error> {
    let (table, column) = owner.link_table();
    sqlx::query_as::<_, Document>(&format!(
        r#"
        SELECT d.* FROM documents d
        JOIN {table} l ON l.document_id = d.id
        WHERE l.{column} = $1
        ORDER BY d.uploaded_at ASC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

/// Unlink a document and delete its row. Returns false when it was not linked to the owner.
pub async fn delete_linked_document(
    pool: &PgPool,
    owner: DocumentOwner,
    owner_id: &str,
    document_id: &str,
) -> Result<bool, sqlx::Error> {
    let (table, column) = owner.link_table();
    let mut tx = pool.begin().await?;
    let unlinked = sqlx::query(&format!("DELETE FROM {table} WHERE {column} = $1 AND document_id = $2"))
        .bind(owner_id)
        .bind(document_id)
        .execute(&mut *tx)
        .await?;
    if unlinked.rows_affected() == 0 {
        return Ok(false);
    }
    sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(document_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(true)
}
