use sqlx::SqlitePool;

use crate::models::{Document, DocumentUid, RestrictionState};
use crate::repository::{DocumentRepository, RepositoryError};

pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    uid: i64,
    record_id: String,
    title: Option<String>,
    restrictions: Option<String>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            uid: row.uid,
            record_id: row.record_id,
            title: row.title,
            restriction: RestrictionState::from_column(row.restrictions.as_deref()),
        }
    }
}

impl SqliteDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, uid: DocumentUid) -> Result<Option<Document>, sqlx::Error> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT uid, record_id, title, restrictions FROM documents WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }
}

impl DocumentRepository for SqliteDocumentRepository {
    async fn find_by_id(&self, uid: DocumentUid) -> Result<Option<Document>, RepositoryError> {
        Ok(self.get_by_id(uid).await?)
    }
}
