use serde::Deserialize;

use crate::resumes::schema::{self, ResumeField};

/// `GET /api/v1/resumes?search=&ordering=`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub field: ResumeField,
    pub descending: bool,
}

impl OrderKey {
    pub fn column(&self) -> &'static str {
        schema::spec_of(self.field).name
    }
}

pub const DEFAULT_ORDERING: OrderKey = OrderKey {
    field: ResumeField::UploadedAt,
    descending: true,
};

/// Validated list request: a case-insensitive substring and a non-empty ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub ordering: Vec<OrderKey>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            ordering: vec![DEFAULT_ORDERING],
        }
    }
}

impl ListQuery {
    pub fn from_params(params: &ListParams) -> Self {
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let mut ordering: Vec<OrderKey> = Vec::new();
        for term in params.ordering.as_deref().unwrap_or("").split(',') {
            let term = term.trim();
            let (name, descending) = match term.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (term, false),
            };
            // Unknown or non-orderable names are ignored, not rejected.
            let Some(spec) = schema::field(name).filter(|spec| spec.orderable) else {
                continue;
            };
            if ordering.iter().all(|key| key.field != spec.field) {
                ordering.push(OrderKey {
                    field: spec.field,
                    descending,
                });
            }
        }
        if ordering.is_empty() {
            ordering.push(DEFAULT_ORDERING);
        }

        Self { search, ordering }
    }
}
