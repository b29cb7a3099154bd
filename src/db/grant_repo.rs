use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::AccessGrantEntry;
use crate::repository::{GrantRepository, PendingGrants, RepositoryError};

pub struct SqliteGrantRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct GrantRow {
    uid: i64,
    fe_user: i64,
    record_id: String,
    inform_user: bool,
    access_granted_notification: Option<String>,
    document_title: Option<String>,
}

const SELECT_GRANTS: &str = r#"
    SELECT g.uid, g.fe_user, g.record_id, g.inform_user, g.access_granted_notification,
           (SELECT d.title FROM documents d WHERE TRIM(d.record_id) = TRIM(g.record_id) LIMIT 1) AS document_title
    FROM access_grants g
"#;

/// Reads a notification timestamp, either RFC 3339 or integer Unix seconds.
fn parse_notified_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
}

impl GrantRow {
    fn into_entry(self) -> Result<AccessGrantEntry, RepositoryError> {
        let notified_at = match self.access_granted_notification.as_deref() {
            Some(ts) if ts.trim().is_empty() => None,
            Some(ts) => Some(parse_notified_at(ts).ok_or_else(|| RepositoryError::CorruptRow {
                table: "access_grants",
                message: format!("uid {}: bad timestamp '{}'", self.uid, ts),
            })?),
            None => None,
        };

        Ok(AccessGrantEntry {
            uid: self.uid,
            user_id: self.fe_user,
            record_id: self.record_id,
            document_title: self.document_title,
            inform_user_pending: self.inform_user,
            notified_at,
        })
    }
}

impl SqliteGrantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, uid: i64) -> Result<Option<AccessGrantEntry>, RepositoryError> {
        let row: Option<GrantRow> = sqlx::query_as(&format!("{} WHERE g.uid = ?", SELECT_GRANTS))
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        row.map(GrantRow::into_entry).transpose()
    }

    pub async fn list_pending(&self) -> Result<Vec<AccessGrantEntry>, RepositoryError> {
        let rows: Vec<GrantRow> = sqlx::query_as(&format!(
            "{} WHERE g.inform_user = 1 ORDER BY g.fe_user, g.uid",
            SELECT_GRANTS
        ))
        .fetch_all(&self.pool)
        .await?;

        // A bad row only drops that grant from this run
        let entries = rows
            .into_iter()
            .filter_map(|row| match row.into_entry() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping pending grant: {}", e);
                    None
                }
            })
            .collect();

        Ok(entries)
    }
}

impl GrantRepository for SqliteGrantRepository {
    async fn find_pending_grouped_by_user(&self) -> Result<PendingGrants, RepositoryError> {
        let mut pending = PendingGrants::new();
        for entry in self.list_pending().await? {
            pending.entry(entry.user_id).or_default().push(entry);
        }
        Ok(pending)
    }

    async fn mark_notified(
        &self,
        entries: &[AccessGrantEntry],
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let at = at.to_rfc3339();

        let mut marked = 0;
        for entry in entries {
            let result = sqlx::query(
                r#"
                UPDATE access_grants
                SET inform_user = 0, access_granted_notification = ?
                WHERE uid = ? AND inform_user = 1
                "#,
            )
            .bind(&at)
            .bind(entry.uid)
            .execute(&mut *tx)
            .await?;
            marked += result.rows_affected();
        }

        tx.commit().await?;
        Ok(marked)
    }
}
