//! Uploaded-file records

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use v3dash_common::models::{NewUploadedFile, UploadedFile};
use v3dash_common::{time, uuid_utils, Error, Result};

const FILE_COLUMNS: &str =
    "id, created_at, file_name, file_type, file_size, status, v3_document_id";

/// Attach a processed file to a document
///
/// Fails with `InvalidInput` for incomplete metadata and `NotFound` for an
/// unknown document.
pub async fn attach_file(
    pool: &SqlitePool,
    document_id: &str,
    meta: &NewUploadedFile,
) -> Result<UploadedFile> {
    let mut conn = pool.acquire().await?;
    attach_with(&mut conn, document_id, meta).await
}

/// Attach on an already-open connection (or transaction)
pub(crate) async fn attach_with(
    conn: &mut SqliteConnection,
    document_id: &str,
    meta: &NewUploadedFile,
) -> Result<UploadedFile> {
    meta.validate()?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM v3_documents WHERE id = ?")
        .bind(document_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(Error::NotFound(format!(
            "Document V3 introuvable: {}",
            document_id
        )));
    }

    let file = UploadedFile {
        id: uuid_utils::generate_id(),
        created_at: time::now(),
        file_name: meta.file_name.clone(),
        file_type: meta.file_type.clone(),
        file_size: meta.file_size,
        status: meta.status,
        v3_document_id: document_id.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO uploaded_files (
            id, created_at, file_name, file_type, file_size, status, v3_document_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&file.id)
    .bind(time::to_storage(&file.created_at))
    .bind(&file.file_name)
    .bind(&file.file_type)
    .bind(file.file_size)
    .bind(file.status.as_str())
    .bind(&file.v3_document_id)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        file_id = %file.id,
        document_id = %document_id,
        file_name = %file.file_name,
        "Uploaded file recorded"
    );

    Ok(file)
}

/// Files attached to one document, oldest first
pub(crate) async fn files_for_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<Vec<UploadedFile>> {
    let sql = format!(
        "SELECT {} FROM uploaded_files WHERE v3_document_id = ? ORDER BY created_at ASC, rowid ASC",
        FILE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(document_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(row_to_file).collect()
}

/// Every uploaded file, newest first
pub async fn list_files(pool: &SqlitePool) -> Result<Vec<UploadedFile>> {
    let sql = format!(
        "SELECT {} FROM uploaded_files ORDER BY created_at DESC, rowid DESC",
        FILE_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(row_to_file).collect()
}

fn row_to_file(row: &SqliteRow) -> Result<UploadedFile> {
    let created_at: String = row.get("created_at");
    let status: String = row.get("status");

    Ok(UploadedFile {
        id: row.get("id"),
        created_at: time::from_storage(&created_at)?,
        file_name: row.get("file_name"),
        file_type: row.get("file_type"),
        file_size: row.get("file_size"),
        status: status.parse()?,
        v3_document_id: row.get("v3_document_id"),
    })
}
