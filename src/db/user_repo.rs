use sqlx::SqlitePool;

use crate::models::{split_id_list, UserProfile, UserUid};
use crate::repository::{RepositoryError, UserRepository};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    uid: i64,
    email: String,
    full_name: String,
    locale: Option<String>,
    usergroup: String,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, uid: UserUid) -> Result<Option<UserProfile>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT uid, email, full_name, locale, usergroup FROM fe_users WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document_access: Vec<(String,)> = sqlx::query_as(
            "SELECT record_id FROM fe_user_document_access WHERE user_uid = ? ORDER BY record_id",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(UserProfile {
            uid: row.uid,
            email: row.email,
            full_name: row.full_name,
            locale: row.locale,
            groups: split_id_list(&row.usergroup),
            document_access: document_access.into_iter().map(|(id,)| id).collect(),
        }))
    }
}

impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, uid: UserUid) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.get_by_id(uid).await?)
    }
}
