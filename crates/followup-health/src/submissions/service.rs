use std::sync::Arc;

use super::domain::{SubmissionId, SubmissionRecord};
use super::repository::{
    MailTransport, OutboundEmail, PageRequest, RepositoryError, SubmissionFilter, SubmissionPage,
    SubmissionRepository, TemplateRepository,
};
use crate::email::{
    build_email_html, default_subject, EmailContent, EmailPlaceholders, EmailTemplate,
    TemplateConfig,
};
use crate::scoring::{CalculatorInputs, GradeRange};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Service composing the scoring engine, the stores, and the mail boundary.
pub struct SubmissionService<S, T, M> {
    submissions: Arc<S>,
    templates: Arc<T>,
    mail: Arc<M>,
    /// Default call-to-action URL when a template's config carries none.
    app_url: String,
}

/// Public submit payload: inputs plus an optional report recipient.
/// Deliberately carries no result fields; results are recomputed here.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRequest {
    pub inputs: CalculatorInputs,
    #[serde(default)]
    pub email: Option<String>,
}

/// What the submit flow reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission: SubmissionRecord,
    pub persisted: bool,
    pub email_status: EmailStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    NotRequested,
    Sent,
    Failed,
}

/// Admin draft for creating or replacing a template row.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDraft {
    pub grade_range: GradeRange,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub config: Option<String>,
}

impl<S, T, M> SubmissionService<S, T, M>
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    pub fn new(submissions: Arc<S>, templates: Arc<T>, mail: Arc<M>, app_url: String) -> Self {
        Self {
            submissions,
            templates,
            mail,
            app_url,
        }
    }

    /// Public submit flow. Persistence and email are each best-effort:
    /// a failed insert never blocks the email, and a failed send never
    /// fails the submission. The receipt reports what actually happened.
    pub fn submit(&self, request: SubmissionRequest) -> SubmissionReceipt {
        let SubmissionRequest { inputs, email } = request;
        let record = SubmissionRecord::from_inputs(inputs, email);

        let persisted = match self.submissions.insert(record.clone()) {
            Ok(_) => true,
            Err(err) => {
                warn!(submission = %record.id, error = %err, "failed to persist submission");
                false
            }
        };

        let email_status = match record.email.as_deref() {
            None => EmailStatus::NotRequested,
            Some(recipient) => self.send_report(&record, recipient),
        };

        info!(
            submission = %record.id,
            grade = %record.results.grade,
            persisted,
            ?email_status,
            "submission processed"
        );

        SubmissionReceipt {
            submission: record,
            persisted,
            email_status,
        }
    }

    fn send_report(&self, record: &SubmissionRecord, recipient: &str) -> EmailStatus {
        let range = record.results.grade.range();
        let template = match self.templates.fetch(range) {
            Ok(template) => template,
            Err(err) => {
                warn!(%range, error = %err, "template lookup failed, using defaults");
                None
            }
        };

        let (subject, custom_content, config) = match template {
            Some(template) => (template.subject, template.body, template.config),
            None => (default_subject(record.results.grade), String::new(), None),
        };

        let cta_url = TemplateConfig::parse(config.as_deref())
            .cta_url
            .unwrap_or_else(|| self.app_url.clone());

        let html = build_email_html(&EmailContent {
            custom_content,
            placeholders: EmailPlaceholders::from_results(&record.results, cta_url),
        });

        let message = OutboundEmail {
            to: recipient.to_string(),
            subject,
            html,
        };

        match self.mail.send(message) {
            Ok(()) => EmailStatus::Sent,
            Err(err) => {
                warn!(submission = %record.id, error = %err, "report email failed");
                EmailStatus::Failed
            }
        }
    }

    /// Admin create; recomputes results, never sends mail.
    pub fn create(
        &self,
        inputs: CalculatorInputs,
        email: Option<String>,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        let record = SubmissionRecord::from_inputs(inputs, email);
        Ok(self.submissions.insert(record)?)
    }

    /// Admin edit; stored results are rederived from the new inputs.
    pub fn update(
        &self,
        id: &SubmissionId,
        inputs: CalculatorInputs,
        email: Option<String>,
    ) -> Result<SubmissionRecord, SubmissionServiceError> {
        let existing = self
            .submissions
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let updated = existing.with_inputs(inputs, email);
        self.submissions.update(updated.clone())?;
        Ok(updated)
    }

    pub fn get(&self, id: &SubmissionId) -> Result<SubmissionRecord, SubmissionServiceError> {
        Ok(self
            .submissions
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    pub fn delete(&self, id: &SubmissionId) -> Result<(), SubmissionServiceError> {
        Ok(self.submissions.delete(id)?)
    }

    pub fn list(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<SubmissionPage, SubmissionServiceError> {
        Ok(self.submissions.list(filter, page)?)
    }

    pub fn templates(&self) -> Result<Vec<EmailTemplate>, SubmissionServiceError> {
        Ok(self.templates.list()?)
    }

    /// Admin upsert, keyed by grade range; blank subject or body is
    /// rejected before the store is touched.
    pub fn upsert_template(
        &self,
        draft: TemplateDraft,
    ) -> Result<EmailTemplate, SubmissionServiceError> {
        if draft.subject.trim().is_empty() {
            return Err(SubmissionServiceError::InvalidTemplate("subject is required"));
        }
        if draft.body.trim().is_empty() {
            return Err(SubmissionServiceError::InvalidTemplate("body is required"));
        }

        let template = EmailTemplate {
            grade_range: draft.grade_range,
            subject: draft.subject,
            body: draft.body,
            config: draft.config,
            updated_at: Utc::now(),
        };

        Ok(self.templates.upsert(template)?)
    }
}

/// Error raised by the admin operations; the public submit flow always
/// returns a receipt instead.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid template: {0}")]
    InvalidTemplate(&'static str),
}
