use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Rejected enumeration code, worded the way it is reported back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidChoice(pub String);

/// How a résumé reached the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSource {
    Email,
    Physical,
    #[default]
    Manual,
    Other,
}

impl ResumeSource {
    pub const ALL: [ResumeSource; 4] = [
        ResumeSource::Email,
        ResumeSource::Physical,
        ResumeSource::Manual,
        ResumeSource::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ResumeSource::Email => "email",
            ResumeSource::Physical => "physical",
            ResumeSource::Manual => "manual",
            ResumeSource::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResumeSource::Email => "E-mail",
            ResumeSource::Physical => "Physical (scanned)",
            ResumeSource::Manual => "Manual entry",
            ResumeSource::Other => "Other",
        }
    }
}

impl FromStr for ResumeSource {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.code() == s)
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

impl fmt::Display for ResumeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Triage state of a résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeStatus {
    #[default]
    PendingReview,
    UnderReview,
    Shortlisted,
    InterviewScheduled,
    Rejected,
    Hired,
}

impl ResumeStatus {
    pub const ALL: [ResumeStatus; 6] = [
        ResumeStatus::PendingReview,
        ResumeStatus::UnderReview,
        ResumeStatus::Shortlisted,
        ResumeStatus::InterviewScheduled,
        ResumeStatus::Rejected,
        ResumeStatus::Hired,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ResumeStatus::PendingReview => "pending_review",
            ResumeStatus::UnderReview => "under_review",
            ResumeStatus::Shortlisted => "shortlisted",
            ResumeStatus::InterviewScheduled => "interview_scheduled",
            ResumeStatus::Rejected => "rejected",
            ResumeStatus::Hired => "hired",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResumeStatus::PendingReview => "Pending review",
            ResumeStatus::UnderReview => "Under review",
            ResumeStatus::Shortlisted => "Shortlisted",
            ResumeStatus::InterviewScheduled => "Interview scheduled",
            ResumeStatus::Rejected => "Rejected",
            ResumeStatus::Hired => "Hired",
        }
    }
}

impl FromStr for ResumeStatus {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.code() == s)
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

impl fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of the extraction hook for a record. Owned by the server, never client-writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    #[default]
    Pending,
    Completed,
    Empty,
    Failed,
    Skipped,
}

impl ExtractionState {
    pub const ALL: [ExtractionState; 5] = [
        ExtractionState::Pending,
        ExtractionState::Completed,
        ExtractionState::Empty,
        ExtractionState::Failed,
        ExtractionState::Skipped,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ExtractionState::Pending => "pending",
            ExtractionState::Completed => "completed",
            ExtractionState::Empty => "empty",
            ExtractionState::Failed => "failed",
            ExtractionState::Skipped => "skipped",
        }
    }
}

impl FromStr for ExtractionState {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.code() == s)
            .ok_or_else(|| InvalidChoice(s.to_string()))
    }
}

/// Raw `resumes` row as stored in Postgres. Enum columns are TEXT guarded by CHECK constraints.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub education_summary: Option<String>,
    pub experience_summary: Option<String>,
    pub skills_summary: Option<String>,
    pub full_text_content: Option<String>,
    pub original_file: String,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub extraction_state: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One uploaded candidate document and its triage state.
#[derive(Debug, Clone, PartialEq)]
pub struct Resume {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub education_summary: Option<String>,
    pub experience_summary: Option<String>,
    pub skills_summary: Option<String>,
    pub full_text_content: Option<String>,
    /// Storage key, e.g. `resumes/<uuid>.pdf`.
    pub original_file: String,
    pub source: ResumeSource,
    pub status: ResumeStatus,
    pub notes: Option<String>,
    pub extraction_state: ExtractionState,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resume {
    /// A fresh record with every optional field empty and default enumerations.
    pub fn new(original_file: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: None,
            email: None,
            phone: None,
            linkedin_url: None,
            education_summary: None,
            experience_summary: None,
            skills_summary: None,
            full_text_content: None,
            original_file,
            source: ResumeSource::default(),
            status: ResumeStatus::default(),
            notes: None,
            extraction_state: ExtractionState::default(),
            uploaded_at: now,
            updated_at: now,
        }
    }

    /// Applies every supplied change. `id` and `uploaded_at` are never touched.
    pub fn apply(&mut self, changes: &ResumeChanges) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut self.full_name, &changes.full_name);
        set(&mut self.email, &changes.email);
        set(&mut self.phone, &changes.phone);
        set(&mut self.linkedin_url, &changes.linkedin_url);
        set(&mut self.education_summary, &changes.education_summary);
        set(&mut self.experience_summary, &changes.experience_summary);
        set(&mut self.skills_summary, &changes.skills_summary);
        set(&mut self.full_text_content, &changes.full_text_content);
        set(&mut self.original_file, &changes.original_file);
        set(&mut self.source, &changes.source);
        set(&mut self.status, &changes.status);
        set(&mut self.notes, &changes.notes);
        set(&mut self.extraction_state, &changes.extraction_state);
    }
}

impl TryFrom<ResumeRow> for Resume {
    type Error = InvalidChoice;

    fn try_from(row: ResumeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            linkedin_url: row.linkedin_url,
            education_summary: row.education_summary,
            experience_summary: row.experience_summary,
            skills_summary: row.skills_summary,
            full_text_content: row.full_text_content,
            original_file: row.original_file,
            source: row.source.parse()?,
            status: row.status.parse()?,
            notes: row.notes,
            extraction_state: row.extraction_state.parse()?,
            uploaded_at: row.uploaded_at,
            updated_at: row.updated_at,
        })
    }
}

/// A set of field mutations. `None` leaves a field alone; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeChanges {
    pub full_name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub linkedin_url: Option<Option<String>>,
    pub education_summary: Option<Option<String>>,
    pub experience_summary: Option<Option<String>>,
    pub skills_summary: Option<Option<String>>,
    pub full_text_content: Option<Option<String>>,
    pub original_file: Option<String>,
    pub source: Option<ResumeSource>,
    pub status: Option<ResumeStatus>,
    pub notes: Option<Option<String>>,
    pub extraction_state: Option<ExtractionState>,
}
