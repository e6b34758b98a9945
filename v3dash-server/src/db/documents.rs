//! V3 document persistence
//!
//! The record is stored wholesale as a JSON text blob; `completion_rate` is
//! recomputed from it on every write and never set independently.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use v3dash_common::models::{
    DocumentStats, FileStats, NewUploadedFile, UploadedFile, V3Document, V3Stats,
};
use v3dash_common::{calculate_completion_rate, time, uuid_utils, Error, Result, V3Record};

use super::files;

const DOCUMENT_COLUMNS: &str = "id, created_at, updated_at, completion_rate, version, data";

/// Create a document, all-empty unless a record is given
pub async fn create_document(pool: &SqlitePool, initial: Option<&V3Record>) -> Result<V3Document> {
    let data = initial.cloned().unwrap_or_default();
    let now = time::now();
    let document = V3Document {
        id: uuid_utils::generate_id(),
        created_at: now,
        updated_at: now,
        completion_rate: calculate_completion_rate(&data),
        version: 1,
        data,
        uploaded_files: Vec::new(),
    };

    sqlx::query(
        r#"
        INSERT INTO v3_documents (id, created_at, updated_at, completion_rate, version, data)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&document.id)
    .bind(time::to_storage(&document.created_at))
    .bind(time::to_storage(&document.updated_at))
    .bind(document.completion_rate as i64)
    .bind(document.version)
    .bind(serialize_record(&document.data)?)
    .execute(pool)
    .await?;

    tracing::info!(
        document_id = %document.id,
        completion_rate = document.completion_rate,
        "V3 document created"
    );

    Ok(document)
}

/// Most recently updated document with its files, or `None` on an empty store
pub async fn get_latest_document(pool: &SqlitePool) -> Result<Option<V3Document>> {
    let mut conn = pool.acquire().await?;

    let sql = format!(
        "SELECT {} FROM v3_documents ORDER BY updated_at DESC, rowid DESC LIMIT 1",
        DOCUMENT_COLUMNS
    );
    let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;

    match row {
        Some(row) => Ok(Some(load_with_files(&mut conn, &row).await?)),
        None => Ok(None),
    }
}

/// One document by id, with its files
pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Option<V3Document>> {
    let mut conn = pool.acquire().await?;
    fetch_document(&mut conn, id).await
}

/// Replace a document's record wholesale
///
/// With `expected_version`, the write only happens if the stored version
/// still matches; otherwise `Conflict`.
pub async fn update_document(
    pool: &SqlitePool,
    id: &str,
    record: &V3Record,
    expected_version: Option<i64>,
) -> Result<V3Document> {
    let mut conn = pool.acquire().await?;
    update_with(&mut conn, id, record, expected_version).await?;

    fetch_document(&mut conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Document V3 introuvable: {}", id)))
}

/// Update the record and attach the file in one transaction
///
/// Either both writes land or neither does.
pub async fn commit_merge(
    pool: &SqlitePool,
    id: &str,
    expected_version: Option<i64>,
    record: &V3Record,
    file: &NewUploadedFile,
) -> Result<(V3Document, UploadedFile)> {
    // Validate before touching the store so a bad file never costs a rollback
    file.validate()?;

    let mut tx = pool.begin().await?;

    update_with(&mut tx, id, record, expected_version).await?;
    let uploaded = files::attach_with(&mut tx, id, file).await?;
    let document = fetch_document(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Document V3 introuvable: {}", id)))?;

    tx.commit().await?;

    tracing::info!(
        document_id = %id,
        file_id = %uploaded.id,
        version = document.version,
        completion_rate = document.completion_rate,
        "Merge committed"
    );

    Ok((document, uploaded))
}

/// File counts by status and document counts by completion
pub async fn compute_stats(pool: &SqlitePool) -> Result<V3Stats> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN status = 'processed' THEN 1 ELSE 0 END), 0) AS processed,
            COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
            COALESCE(SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END), 0) AS error
        FROM uploaded_files
        "#,
    )
    .fetch_one(pool)
    .await?;

    let files = FileStats {
        total: row.get("total"),
        processed: row.get("processed"),
        pending: row.get("pending"),
        error: row.get("error"),
    };

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN completion_rate = 100 THEN 1 ELSE 0 END), 0) AS completed
        FROM v3_documents
        "#,
    )
    .fetch_one(pool)
    .await?;

    let total: i64 = row.get("total");
    let completed: i64 = row.get("completed");

    Ok(V3Stats {
        files,
        v3_documents: DocumentStats {
            total,
            completed,
            in_progress: total - completed,
        },
    })
}

async fn update_with(
    conn: &mut SqliteConnection,
    id: &str,
    record: &V3Record,
    expected_version: Option<i64>,
) -> Result<()> {
    let completion_rate = calculate_completion_rate(record);
    let data = serialize_record(record)?;

    let result = sqlx::query(
        r#"
        UPDATE v3_documents
        SET data = ?, completion_rate = ?, updated_at = ?, version = version + 1
        WHERE id = ? AND (? IS NULL OR version = ?)
        "#,
    )
    .bind(&data)
    .bind(completion_rate as i64)
    .bind(time::to_storage(&time::now()))
    .bind(id)
    .bind(expected_version)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM v3_documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        return Err(match current {
            None => Error::NotFound(format!("Document V3 introuvable: {}", id)),
            Some(version) => {
                tracing::warn!(
                    document_id = %id,
                    expected = ?expected_version,
                    actual = version,
                    "Stale V3 document update rejected"
                );
                Error::Conflict(format!(
                    "Le document V3 a été modifié entre-temps (version {} attendue, {} trouvée)",
                    expected_version.unwrap_or_default(),
                    version
                ))
            }
        });
    }

    tracing::debug!(document_id = %id, completion_rate, "V3 document updated");

    Ok(())
}

async fn fetch_document(conn: &mut SqliteConnection, id: &str) -> Result<Option<V3Document>> {
    let sql = format!("SELECT {} FROM v3_documents WHERE id = ?", DOCUMENT_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;

    match row {
        Some(row) => Ok(Some(load_with_files(conn, &row).await?)),
        None => Ok(None),
    }
}

async fn load_with_files(conn: &mut SqliteConnection, row: &SqliteRow) -> Result<V3Document> {
    let mut document = row_to_document(row)?;
    document.uploaded_files = files::files_for_document(conn, &document.id).await?;
    Ok(document)
}

fn row_to_document(row: &SqliteRow) -> Result<V3Document> {
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let completion_rate: i64 = row.get("completion_rate");
    let data: String = row.get("data");

    let data: V3Record = serde_json::from_str(&data)
        .map_err(|e| Error::Internal(format!("Failed to deserialize V3 record: {}", e)))?;

    Ok(V3Document {
        id: row.get("id"),
        created_at: time::from_storage(&created_at)?,
        updated_at: time::from_storage(&updated_at)?,
        completion_rate: completion_rate.clamp(0, 100) as u8,
        version: row.get("version"),
        data,
        uploaded_files: Vec::new(),
    })
}

fn serialize_record(record: &V3Record) -> Result<String> {
    serde_json::to_string(record)
        .map_err(|e| Error::Internal(format!("Failed to serialize V3 record: {}", e)))
}
