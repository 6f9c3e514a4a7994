use followup_health::config::MailConfig;
use followup_health::email::EmailTemplate;
use followup_health::scoring::GradeRange;
use followup_health::submissions::{
    MailError, MailTransport, OutboundEmail, PageRequest, RepositoryError, SubmissionFilter,
    SubmissionId, SubmissionPage, SubmissionRecord, SubmissionRepository, TemplateRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Submission store backing the service until a relational store is wired
/// in; keeps records newest-first the way the admin console lists them.
#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionRepository {
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl SubmissionRepository for InMemorySubmissionRepository {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        Ok(guard.iter().find(|record| record.id == *id).cloned())
    }

    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("submission mutex poisoned");
        let before = guard.len();
        guard.retain(|record| record.id != *id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn list(
        &self,
        filter: &SubmissionFilter,
        page: PageRequest,
    ) -> Result<SubmissionPage, RepositoryError> {
        let guard = self.records.lock().expect("submission mutex poisoned");
        let mut matching: Vec<SubmissionRecord> = guard
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len();
        let submissions = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect();

        Ok(SubmissionPage {
            submissions,
            page: page.page,
            limit: page.limit,
            total,
        })
    }
}

/// Template store; one row per grade range, matching the unique key the
/// relational schema enforces.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTemplateRepository {
    templates: Arc<Mutex<BTreeMap<GradeRange, EmailTemplate>>>,
}

impl TemplateRepository for InMemoryTemplateRepository {
    fn upsert(&self, template: EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        let mut guard = self.templates.lock().expect("template mutex poisoned");
        guard.insert(template.grade_range, template.clone());
        Ok(template)
    }

    fn fetch(&self, range: GradeRange) -> Result<Option<EmailTemplate>, RepositoryError> {
        let guard = self.templates.lock().expect("template mutex poisoned");
        Ok(guard.get(&range).cloned())
    }

    fn list(&self) -> Result<Vec<EmailTemplate>, RepositoryError> {
        let guard = self.templates.lock().expect("template mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Outbox transport: records every accepted message and logs it. This is
/// the seam where a Mailgun HTTP adapter plugs in; an unconfigured
/// environment refuses sends the same way the adapter would.
#[derive(Clone)]
pub(crate) struct OutboxMailTransport {
    configured: bool,
    from_address: Option<String>,
    outbox: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl OutboxMailTransport {
    pub(crate) fn from_config(config: &MailConfig) -> Self {
        Self {
            configured: config.is_configured(),
            from_address: config.from_address(),
            outbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[cfg(test)]
    pub(crate) fn sent(&self) -> Vec<OutboundEmail> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

impl MailTransport for OutboxMailTransport {
    fn send(&self, message: OutboundEmail) -> Result<(), MailError> {
        if !self.configured {
            return Err(MailError::NotConfigured);
        }

        info!(
            to = %message.to,
            subject = %message.subject,
            from = self.from_address.as_deref().unwrap_or("unset"),
            bytes = message.html.len(),
            "report email queued"
        );

        let mut guard = self.outbox.lock().expect("outbox mutex poisoned");
        guard.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use followup_health::scoring::{
        AfterHoursCoverage, CalculatorInputs, FollowUpDepth, PatientValue, ResponseTime,
    };

    fn record(email: Option<&str>) -> SubmissionRecord {
        SubmissionRecord::from_inputs(
            CalculatorInputs {
                monthly_inquiries: 100,
                response_time: ResponseTime::SameDay,
                follow_up_depth: FollowUpDepth::One,
                patient_value: PatientValue::From500To1000,
                after_hours: AfterHoursCoverage::No,
            },
            email.map(str::to_string),
        )
    }

    #[test]
    fn insert_fetch_update_delete_round_trip() {
        let repo = InMemorySubmissionRepository::default();
        let stored = repo.insert(record(None)).expect("insert");
        let id = stored.id;

        assert!(repo.fetch(&id).expect("fetch").is_some());

        let mut changed = stored.clone();
        changed.email = Some("front-desk@clinic.example".to_string());
        repo.update(changed).expect("update");
        assert_eq!(
            repo.fetch(&id)
                .expect("fetch")
                .expect("record present")
                .email
                .as_deref(),
            Some("front-desk@clinic.example")
        );

        repo.delete(&id).expect("delete");
        assert!(repo.fetch(&id).expect("fetch").is_none());
        assert!(matches!(repo.delete(&id), Err(RepositoryError::NotFound)));
    }

    #[test]
    fn list_paginates_and_reports_total() {
        let repo = InMemorySubmissionRepository::default();
        for _ in 0..5 {
            repo.insert(record(None)).expect("insert");
        }

        let page = repo
            .list(
                &SubmissionFilter::default(),
                PageRequest { page: 2, limit: 2 },
            )
            .expect("list");
        assert_eq!(page.total, 5);
        assert_eq!(page.submissions.len(), 2);
        assert_eq!(page.page, 2);
    }

    #[test]
    fn list_filters_by_email_presence() {
        let repo = InMemorySubmissionRepository::default();
        repo.insert(record(Some("a@clinic.example"))).expect("insert");
        repo.insert(record(None)).expect("insert");

        let filter = SubmissionFilter {
            has_email: Some(true),
            ..SubmissionFilter::default()
        };
        let page = repo.list(&filter, PageRequest::default()).expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(
            page.submissions[0].email.as_deref(),
            Some("a@clinic.example")
        );
    }

    #[test]
    fn template_upsert_replaces_per_range() {
        use chrono::Utc;

        let repo = InMemoryTemplateRepository::default();
        let first = EmailTemplate {
            grade_range: GradeRange::A,
            subject: "first".to_string(),
            body: "body".to_string(),
            config: None,
            updated_at: Utc::now(),
        };
        repo.upsert(first.clone()).expect("upsert");
        repo.upsert(EmailTemplate {
            subject: "second".to_string(),
            ..first
        })
        .expect("upsert");

        let stored = repo
            .fetch(GradeRange::A)
            .expect("fetch")
            .expect("template present");
        assert_eq!(stored.subject, "second");
        assert_eq!(repo.list().expect("list").len(), 1);
    }

    #[test]
    fn unconfigured_transport_refuses_sends() {
        let transport = OutboxMailTransport::from_config(&MailConfig {
            api_key: None,
            domain: None,
            app_url: "https://followuphealth.clinic".to_string(),
        });

        let result = transport.send(OutboundEmail {
            to: "x@clinic.example".to_string(),
            subject: "s".to_string(),
            html: "<p>hi</p>".to_string(),
        });
        assert!(matches!(result, Err(MailError::NotConfigured)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn configured_transport_records_messages() {
        let transport = OutboxMailTransport::from_config(&MailConfig {
            api_key: Some("key-test".to_string()),
            domain: Some("mg.clinic.example".to_string()),
            app_url: "https://followuphealth.clinic".to_string(),
        });

        transport
            .send(OutboundEmail {
                to: "x@clinic.example".to_string(),
                subject: "s".to_string(),
                html: "<p>hi</p>".to_string(),
            })
            .expect("send accepted");
        assert_eq!(transport.sent().len(), 1);
    }
}
