use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::ExtractedFields;
use crate::models::resume::{ExtractionState, Resume, ResumeChanges, ResumeRow};
use crate::resumes::query::ListQuery;
use crate::resumes::schema;

/// Persistence seam for résumé records. Carried in `ResumeStore` as `Arc<dyn ResumeRepository>`.
#[async_trait]
pub trait ResumeRepository: Send + Sync {
    async fn insert(&self, resume: &Resume) -> Result<Resume, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Resume>, AppError>;

    async fn list(&self, query: &ListQuery) -> Result<Vec<Resume>, AppError>;

    /// Applies the supplied changes and refreshes `updated_at`. `None` if the id is unknown.
    async fn update(&self, id: Uuid, changes: &ResumeChanges)
        -> Result<Option<UpdatedResume>, AppError>;

    /// Stores the extraction outcome. Extracted values only land in fields that
    /// are empty at the moment of the write.
    async fn record_extraction(
        &self,
        id: Uuid,
        state: ExtractionState,
        extracted: Option<&ExtractedFields>,
    ) -> Result<Option<Resume>, AppError>;

    /// Removes the row and returns it, so the caller can release the stored file.
    async fn delete(&self, id: Uuid) -> Result<Option<Resume>, AppError>;
}

/// Row after an update, plus the file key it referenced just before the write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedResume {
    pub resume: Resume,
    pub previous_file: String,
}

#[derive(FromRow)]
struct UpdatedRow {
    #[sqlx(flatten)]
    resume_row: ResumeRow,
    previous_file: String,
}

pub struct PgResumeRepository {
    pool: PgPool,
}

impl PgResumeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_resume(row: ResumeRow) -> Result<Resume, AppError> {
    let id = row.id;
    Resume::try_from(row)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt resume row {id}: {e}")))
}

/// Escapes LIKE metacharacters so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ResumeRepository for PgResumeRepository {
    async fn insert(&self, resume: &Resume) -> Result<Resume, AppError> {
        let row: ResumeRow = sqlx::query_as(
            r#"
            INSERT INTO resumes
                (id, full_name, email, phone, linkedin_url, education_summary,
                 experience_summary, skills_summary, full_text_content, original_file,
                 source, status, notes, extraction_state, uploaded_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(&resume.full_name)
        .bind(&resume.email)
        .bind(&resume.phone)
        .bind(&resume.linkedin_url)
        .bind(&resume.education_summary)
        .bind(&resume.experience_summary)
        .bind(&resume.skills_summary)
        .bind(&resume.full_text_content)
        .bind(&resume.original_file)
        .bind(resume.source.code())
        .bind(resume.status.code())
        .bind(&resume.notes)
        .bind(resume.extraction_state.code())
        .bind(resume.uploaded_at)
        .bind(resume.updated_at)
        .fetch_one(&self.pool)
        .await?;

        into_resume(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_resume).transpose()
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Resume>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM resumes");

        if let Some(term) = &query.search {
            let pattern = like_pattern(term);
            qb.push(" WHERE (");
            {
                let mut clauses = qb.separated(" OR ");
                for spec in schema::search_fields() {
                    // Column names come from the static schema, never from the request.
                    clauses.push(spec.name);
                    clauses.push_unseparated(" ILIKE ");
                    clauses.push_bind_unseparated(pattern.clone());
                }
            }
            qb.push(")");
        }

        qb.push(" ORDER BY ");
        for key in &query.ordering {
            qb.push(key.column());
            qb.push(if key.descending { " DESC, " } else { " ASC, " });
        }
        qb.push("id ASC");

        let rows: Vec<ResumeRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(into_resume).collect()
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &ResumeChanges,
    ) -> Result<Option<UpdatedResume>, AppError> {
        // The locked CTE reads the key being replaced in the same statement.
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "WITH previous AS (\
             SELECT id AS previous_id, original_file AS previous_file \
             FROM resumes WHERE id = ",
        );
        qb.push_bind(id);
        qb.push(
            " FOR UPDATE) UPDATE resumes \
             SET updated_at = GREATEST(updated_at + interval '1 microsecond', now())",
        );

        let texts = [
            ("full_name", &changes.full_name),
            ("email", &changes.email),
            ("phone", &changes.phone),
            ("linkedin_url", &changes.linkedin_url),
            ("education_summary", &changes.education_summary),
            ("experience_summary", &changes.experience_summary),
            ("skills_summary", &changes.skills_summary),
            ("full_text_content", &changes.full_text_content),
            ("notes", &changes.notes),
        ];
        for (column, value) in texts {
            if let Some(value) = value {
                qb.push(format!(", {column} = ")).push_bind(value.clone());
            }
        }
        if let Some(original_file) = &changes.original_file {
            qb.push(", original_file = ").push_bind(original_file.clone());
        }
        if let Some(source) = changes.source {
            qb.push(", source = ").push_bind(source.code());
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status.code());
        }
        if let Some(state) = changes.extraction_state {
            qb.push(", extraction_state = ").push_bind(state.code());
        }

        qb.push(
            " FROM previous WHERE resumes.id = previous.previous_id \
             RETURNING resumes.*, previous.previous_file",
        );

        let row: Option<UpdatedRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(|updated| {
            Ok(UpdatedResume {
                resume: into_resume(updated.resume_row)?,
                previous_file: updated.previous_file,
            })
        })
        .transpose()
    }

    async fn record_extraction(
        &self,
        id: Uuid,
        state: ExtractionState,
        extracted: Option<&ExtractedFields>,
    ) -> Result<Option<Resume>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "UPDATE resumes \
             SET updated_at = GREATEST(updated_at + interval '1 microsecond', now()), \
             extraction_state = ",
        );
        qb.push_bind(state.code());

        let candidates = extracted.map(ExtractedFields::candidates).unwrap_or_default();
        for (field, value) in candidates {
            let column = schema::spec_of(field).name;
            qb.push(format!(
                ", {column} = CASE WHEN coalesce(btrim({column}), '') = '' THEN "
            ));
            qb.push_bind(value.to_string());
            qb.push(format!(" ELSE {column} END"));
        }

        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let row: Option<ResumeRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(into_resume).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as("DELETE FROM resumes WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_resume).transpose()
    }
}
