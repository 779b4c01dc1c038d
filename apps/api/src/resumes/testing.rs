//! Test doubles shared by the store and handler tests.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{merge_extracted, ExtractedFields};
use crate::models::resume::{ExtractionState, Resume, ResumeChanges};
use crate::resumes::form::Upload;
use crate::resumes::query::{ListQuery, OrderKey};
use crate::resumes::repository::{ResumeRepository, UpdatedResume};
use crate::resumes::schema::{self, ResumeField};
use crate::resumes::wire::text_of;

pub fn upload(filename: &str) -> Upload {
    Upload {
        filename: filename.to_string(),
        content_type: Some("application/pdf".to_string()),
        data: Bytes::from_static(b"%PDF-1.4 test"),
    }
}

/// Mirrors `PgResumeRepository` semantics, including Postgres NULL ordering.
#[derive(Default)]
pub struct InMemoryResumeRepository {
    rows: Mutex<Vec<Resume>>,
    fail_writes: AtomicBool,
}

impl InMemoryResumeRepository {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Same rule as the SQL: at least one microsecond later than the previous value.
fn touch(row: &mut Resume) {
    row.updated_at = (row.updated_at + Duration::microseconds(1)).max(Utc::now());
}

fn matches_search(resume: &Resume, term: &str) -> bool {
    let term = term.to_lowercase();
    schema::search_fields().any(|spec| {
        text_of(resume, spec.field).is_some_and(|value| value.to_lowercase().contains(&term))
    })
}

fn compare_key(a: &Resume, b: &Resume, key: &OrderKey) -> Ordering {
    let ordering = match key.field {
        ResumeField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
        field => match (text_of(a, field), text_of(b, field)) {
            (Some(x), Some(y)) => x.cmp(y),
            // NULL sorts after every value ascending, like Postgres.
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
    };
    if key.descending {
        ordering.reverse()
    } else {
        ordering
    }
}

#[async_trait]
impl ResumeRepository for InMemoryResumeRepository {
    async fn insert(&self, resume: &Resume) -> Result<Resume, AppError> {
        self.check_writable()?;
        self.rows.lock().unwrap().push(resume.clone());
        Ok(resume.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Resume>, AppError> {
        let mut rows: Vec<Resume> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.search.as_deref().map_or(true, |t| matches_search(r, t)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            query
                .ordering
                .iter()
                .map(|key| compare_key(a, b, key))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &ResumeChanges,
    ) -> Result<Option<UpdatedResume>, AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        let previous_file = row.original_file.clone();
        row.apply(changes);
        touch(row);
        Ok(Some(UpdatedResume {
            resume: row.clone(),
            previous_file,
        }))
    }

    async fn record_extraction(
        &self,
        id: Uuid,
        state: ExtractionState,
        extracted: Option<&ExtractedFields>,
    ) -> Result<Option<Resume>, AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        // Merged against the current row under the lock, like the SQL CASE.
        if let Some(extracted) = extracted {
            let changes = merge_extracted(row, extracted);
            row.apply(&changes);
        }
        row.extraction_state = state;
        touch(row);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let position = rows.iter().position(|r| r.id == id);
        Ok(position.map(|i| rows.remove(i)))
    }
}
