use super::domain::{SubmissionId, SubmissionRecord};
use crate::email::EmailTemplate;
use crate::scoring::GradeRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SubmissionRepository: Send + Sync {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError>;
    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError>;
    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError>;
    fn list(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<SubmissionPage, RepositoryError>;
}

/// Template store, keyed uniquely by grade range.
pub trait TemplateRepository: Send + Sync {
    fn upsert(&self, template: EmailTemplate) -> Result<EmailTemplate, RepositoryError>;
    fn fetch(&self, range: GradeRange) -> Result<Option<EmailTemplate>, RepositoryError>;
    fn list(&self) -> Result<Vec<EmailTemplate>, RepositoryError>;
}

/// Outbound transactional-mail boundary (e.g. a Mailgun adapter).
pub trait MailTransport: Send + Sync {
    fn send(&self, message: OutboundEmail) -> Result<(), MailError>;
}

/// One rendered message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Admin-console listing filters; all conjunctive, all optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmissionFilter {
    /// Matches grades beginning with this prefix ("B" matches B+, B, B-).
    pub grade_prefix: Option<String>,
    pub has_email: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SubmissionFilter {
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        if let Some(prefix) = &self.grade_prefix {
            if !record.results.grade.label().starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(has_email) = self.has_email {
            if record.email.is_some() != has_email {
                return false;
            }
        }
        let created = record.created_at.date_naive();
        if let Some(start) = self.start_date {
            if created < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if created > end {
                return false;
            }
        }
        true
    }
}

/// 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of submissions, newest first, plus the unpaged total.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPage {
    pub submissions: Vec<SubmissionRecord>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Mail dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,
    #[error("mail transport failure: {0}")]
    Transport(String),
}
