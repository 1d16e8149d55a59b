use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::model::{Resource, Submission, SubmissionStatus};
use crate::remote::error::RemoteError;
use crate::remote::mirror::RemoteMirror;

const PULL_QUERY: &str = "SELECT id, student_id, student_name, file_name, file_url, subject, \
     status, ai_score, teacher_approved, weak_topics, recommended_resources, \
     created_at, updated_at \
     FROM submissions ORDER BY created_at DESC";

/// A PostgreSQL implementation of the RemoteMirror trait
pub struct PostgresMirror {
    pool: PgPool,
}

impl PostgresMirror {
    /// Create a new PostgresMirror with the given connection URL.
    ///
    /// The pool connects lazily: construction never touches the network,
    /// so an unreachable remote surfaces as failed pulls and pushes, not
    /// as a startup failure.
    pub fn new(database_url: &str, max_connections: u32) -> Result<Self, RemoteError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(60))
            .connect_lazy(database_url)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                RemoteError::ConnectionError(e.to_string())
            })?;

        Ok(PostgresMirror { pool })
    }

    /// Create the submissions table and its indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), RemoteError> {
        debug!("Ensuring submissions table exists");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                student_name TEXT,
                file_name TEXT NOT NULL,
                file_url TEXT,
                subject TEXT,
                status TEXT NOT NULL,
                ai_score INTEGER,
                teacher_approved BOOLEAN NOT NULL DEFAULT FALSE,
                weak_topics JSONB NOT NULL DEFAULT '[]',
                recommended_resources JSONB NOT NULL DEFAULT '[]',
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create submissions table: {}", e);
            RemoteError::QueryError(format!("Failed to create table: {}", e))
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS submissions_created_at_idx \
             ON submissions (created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create index: {}", e);
            RemoteError::QueryError(format!("Failed to create index: {}", e))
        })?;

        info!("Submissions schema ready");
        Ok(())
    }
}

/// Maps a remote row to a Submission, filling the defaults the product
/// uses for rows written by older clients with fewer columns populated
fn submission_from_row(row: &PgRow) -> Result<Submission, RemoteError> {
    let de = |e: sqlx::Error| RemoteError::DeserializationError(e.to_string());

    let id: String = row.try_get("id").map_err(de)?;

    let status_raw: Option<String> = row.try_get("status").map_err(de)?;
    let status = match status_raw.as_deref() {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Unknown status '{raw}' on remote row {id}, treating as pending");
            SubmissionStatus::Pending
        }),
        None => SubmissionStatus::Pending,
    };

    let weak_topics: Option<Json<Vec<String>>> = row.try_get("weak_topics").map_err(de)?;
    let recommended_resources: Option<Json<Vec<Resource>>> =
        row.try_get("recommended_resources").map_err(de)?;

    Ok(Submission {
        student_id: row
            .try_get::<Option<String>, _>("student_id")
            .map_err(de)?
            .unwrap_or_default(),
        student_name: row
            .try_get::<Option<String>, _>("student_name")
            .map_err(de)?
            .unwrap_or_else(|| "Student".to_string()),
        file_name: row
            .try_get::<Option<String>, _>("file_name")
            .map_err(de)?
            .unwrap_or_default(),
        file_url: row
            .try_get::<Option<String>, _>("file_url")
            .map_err(de)?
            .unwrap_or_else(|| "#".to_string()),
        subject: row
            .try_get::<Option<String>, _>("subject")
            .map_err(de)?
            .unwrap_or_else(|| "General".to_string()),
        status,
        ai_score: row.try_get("ai_score").map_err(de)?,
        teacher_approved: row
            .try_get::<Option<bool>, _>("teacher_approved")
            .map_err(de)?
            .unwrap_or(false),
        weak_topics: weak_topics.map(|j| j.0).unwrap_or_default(),
        recommended_resources: recommended_resources.map(|j| j.0).unwrap_or_default(),
        created_at: row.try_get("created_at").map_err(de)?,
        updated_at: row.try_get("updated_at").map_err(de)?,
        id,
    })
}

#[async_trait]
impl RemoteMirror for PostgresMirror {
    async fn pull(&self) -> Result<Vec<Submission>, RemoteError> {
        debug!("Pulling full submission collection from remote");

        let rows = match sqlx::query(PULL_QUERY).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                if e.to_string().contains("does not exist") {
                    warn!("Submissions table does not exist, returning empty result");
                    return Ok(Vec::new());
                }
                error!("Remote pull failed: {}", e);
                return Err(RemoteError::QueryError(e.to_string()));
            }
        };

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            result.push(submission_from_row(row)?);
        }

        info!("Pulled {} submissions from remote", result.len());
        Ok(result)
    }

    async fn push(&self, records: &[Submission]) -> Result<(), RemoteError> {
        if records.is_empty() {
            debug!("Nothing to push, skipping");
            return Ok(());
        }

        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO submissions (id, student_id, student_name, file_name, file_url, \
             subject, status, ai_score, teacher_approved, weak_topics, \
             recommended_resources, created_at, updated_at) ",
        );

        query_builder.push_values(records, |mut b, sub| {
            b.push_bind(&sub.id)
                .push_bind(&sub.student_id)
                .push_bind(&sub.student_name)
                .push_bind(&sub.file_name)
                .push_bind(&sub.file_url)
                .push_bind(&sub.subject)
                .push_bind(sub.status.as_str())
                .push_bind(sub.ai_score)
                .push_bind(sub.teacher_approved)
                .push_bind(Json(&sub.weak_topics))
                .push_bind(Json(&sub.recommended_resources))
                .push_bind(sub.created_at)
                .push_bind(sub.updated_at);
        });

        query_builder.push(
            " ON CONFLICT (id) DO UPDATE SET \
             student_id = EXCLUDED.student_id, \
             student_name = EXCLUDED.student_name, \
             file_name = EXCLUDED.file_name, \
             file_url = EXCLUDED.file_url, \
             subject = EXCLUDED.subject, \
             status = EXCLUDED.status, \
             ai_score = EXCLUDED.ai_score, \
             teacher_approved = EXCLUDED.teacher_approved, \
             weak_topics = EXCLUDED.weak_topics, \
             recommended_resources = EXCLUDED.recommended_resources, \
             created_at = EXCLUDED.created_at, \
             updated_at = EXCLUDED.updated_at",
        );

        query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Remote push failed: {}", e);
                RemoteError::QueryError(e.to_string())
            })?;

        debug!("Pushed {} submissions to remote", records.len());
        Ok(())
    }
}
