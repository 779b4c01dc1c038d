//! Static field schema for the résumé resource.
//!
//! One table drives request validation (`form`), the response encoder (`wire`)
//! and the list query (`query`, `repository`), so the three cannot drift apart.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResumeField {
    Id,
    FullName,
    Email,
    Phone,
    LinkedinUrl,
    EducationSummary,
    ExperienceSummary,
    SkillsSummary,
    FullTextContent,
    OriginalFile,
    OriginalFileUrl,
    Source,
    Status,
    Notes,
    ExtractionState,
    UploadedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    /// Short text with a length cap.
    Text { max_len: usize },
    Email { max_len: usize },
    Url { max_len: usize },
    LongText,
    /// Upload on write, storage key on read.
    File,
    /// Absolute URL computed per request.
    FileUrl,
    Choice,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: ResumeField,
    /// Wire name and Postgres column name.
    pub name: &'static str,
    pub kind: FieldKind,
    pub access: Access,
    pub searchable: bool,
    pub orderable: bool,
}

impl FieldSpec {
    const fn new(field: ResumeField, name: &'static str, kind: FieldKind, access: Access) -> Self {
        Self {
            field,
            name,
            kind,
            access,
            searchable: false,
            orderable: false,
        }
    }

    const fn searchable(self) -> Self {
        Self {
            searchable: true,
            ..self
        }
    }

    const fn orderable(self) -> Self {
        Self {
            orderable: true,
            ..self
        }
    }

    pub fn is_writable(&self) -> bool {
        self.access == Access::ReadWrite
    }
}

use Access::{ReadOnly, ReadWrite};

/// Every field of the resource, in wire order.
pub const RESUME_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(ResumeField::Id, "id", FieldKind::Id, ReadOnly),
    FieldSpec::new(ResumeField::FullName, "full_name", FieldKind::Text { max_len: 255 }, ReadWrite)
        .searchable()
        .orderable(),
    FieldSpec::new(ResumeField::Email, "email", FieldKind::Email { max_len: 255 }, ReadWrite)
        .searchable(),
    FieldSpec::new(ResumeField::Phone, "phone", FieldKind::Text { max_len: 255 }, ReadWrite)
        .searchable(),
    FieldSpec::new(ResumeField::LinkedinUrl, "linkedin_url", FieldKind::Url { max_len: 500 }, ReadWrite),
    FieldSpec::new(ResumeField::EducationSummary, "education_summary", FieldKind::LongText, ReadWrite)
        .searchable(),
    FieldSpec::new(ResumeField::ExperienceSummary, "experience_summary", FieldKind::LongText, ReadWrite)
        .searchable(),
    FieldSpec::new(ResumeField::SkillsSummary, "skills_summary", FieldKind::LongText, ReadWrite)
        .searchable(),
    FieldSpec::new(ResumeField::FullTextContent, "full_text_content", FieldKind::LongText, ReadOnly)
        .searchable(),
    FieldSpec::new(ResumeField::OriginalFile, "original_file", FieldKind::File, ReadWrite),
    FieldSpec::new(ResumeField::OriginalFileUrl, "original_file_url", FieldKind::FileUrl, ReadOnly),
    FieldSpec::new(ResumeField::Source, "source", FieldKind::Choice, ReadWrite).searchable(),
    FieldSpec::new(ResumeField::Status, "status", FieldKind::Choice, ReadWrite)
        .searchable()
        .orderable(),
    FieldSpec::new(ResumeField::Notes, "notes", FieldKind::LongText, ReadWrite),
    FieldSpec::new(ResumeField::ExtractionState, "extraction_state", FieldKind::Choice, ReadOnly),
    FieldSpec::new(ResumeField::UploadedAt, "uploaded_at", FieldKind::Timestamp, ReadOnly).orderable(),
    FieldSpec::new(ResumeField::UpdatedAt, "updated_at", FieldKind::Timestamp, ReadOnly),
];

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    RESUME_FIELDS.iter().find(|spec| spec.name == name)
}

pub fn spec_of(field: ResumeField) -> &'static FieldSpec {
    RESUME_FIELDS
        .iter()
        .find(|spec| spec.field == field)
        .unwrap_or_else(|| unreachable!("{field:?} missing from RESUME_FIELDS"))
}

pub fn search_fields() -> impl Iterator<Item = &'static FieldSpec> {
    RESUME_FIELDS.iter().filter(|spec| spec.searchable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_fields() {
        let names: Vec<&str> = search_fields().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "full_name",
                "email",
                "phone",
                "education_summary",
                "experience_summary",
                "skills_summary",
                "full_text_content",
                "source",
                "status",
            ]
        );
    }

    #[test]
    fn test_orderable_fields() {
        let names: Vec<&str> = RESUME_FIELDS
            .iter()
            .filter(|s| s.orderable)
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["full_name", "status", "uploaded_at"]);
    }

    #[test]
    fn test_server_owned_fields_are_read_only() {
        for name in [
            "id",
            "full_text_content",
            "original_file_url",
            "extraction_state",
            "uploaded_at",
            "updated_at",
        ] {
            assert!(!field(name).unwrap().is_writable(), "{name} should be read-only");
        }
        assert!(field("notes").unwrap().is_writable());
        assert!(field("original_file").unwrap().is_writable());
    }

    #[test]
    fn test_every_field_listed_once() {
        for spec in RESUME_FIELDS {
            assert_eq!(spec_of(spec.field).name, spec.name);
        }
        assert!(field("nonexistent").is_none());
    }
}
