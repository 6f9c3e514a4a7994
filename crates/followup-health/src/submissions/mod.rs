//! Submission intake, admin CRUD, and the report-email dispatch flow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{SubmissionId, SubmissionRecord};
pub use repository::{
    MailError, MailTransport, OutboundEmail, PageRequest, RepositoryError, SubmissionFilter,
    SubmissionPage, SubmissionRepository, TemplateRepository,
};
pub use router::submission_router;
pub use service::{
    EmailStatus, SubmissionReceipt, SubmissionRequest, SubmissionService, SubmissionServiceError,
    TemplateDraft,
};
