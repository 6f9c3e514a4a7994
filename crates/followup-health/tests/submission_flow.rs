use std::sync::{Arc, Mutex};

use followup_health::email::EmailTemplate;
use followup_health::scoring::{
    AfterHoursCoverage, CalculatorInputs, FollowUpDepth, GradeRange, PatientValue, ResponseTime,
};
use followup_health::submissions::{
    EmailStatus, MailError, MailTransport, OutboundEmail, PageRequest, RepositoryError,
    SubmissionFilter, SubmissionId, SubmissionPage, SubmissionRecord, SubmissionRepository,
    SubmissionRequest, SubmissionService, SubmissionServiceError, TemplateDraft,
    TemplateRepository,
};

#[derive(Default)]
struct MemorySubmissions {
    records: Mutex<Vec<SubmissionRecord>>,
    fail_inserts: bool,
}

impl MemorySubmissions {
    fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_inserts: true,
        }
    }

    fn stored(&self) -> Vec<SubmissionRecord> {
        self.records.lock().expect("records mutex").clone()
    }
}

impl SubmissionRepository for MemorySubmissions {
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        if self.fail_inserts {
            return Err(RepositoryError::Unavailable("store offline".to_string()));
        }
        let mut guard = self.records.lock().expect("records mutex");
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("records mutex");
        match guard.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("records mutex");
        Ok(guard.iter().find(|record| record.id == *id).cloned())
    }

    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("records mutex");
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
        let guard = self.records.lock().expect("records mutex");
        let matching: Vec<SubmissionRecord> = guard
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
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

#[derive(Default)]
struct MemoryTemplates {
    templates: Mutex<Vec<EmailTemplate>>,
}

impl TemplateRepository for MemoryTemplates {
    fn upsert(&self, template: EmailTemplate) -> Result<EmailTemplate, RepositoryError> {
        let mut guard = self.templates.lock().expect("templates mutex");
        guard.retain(|existing| existing.grade_range != template.grade_range);
        guard.push(template.clone());
        Ok(template)
    }

    fn fetch(&self, range: GradeRange) -> Result<Option<EmailTemplate>, RepositoryError> {
        let guard = self.templates.lock().expect("templates mutex");
        Ok(guard
            .iter()
            .find(|template| template.grade_range == range)
            .cloned())
    }

    fn list(&self) -> Result<Vec<EmailTemplate>, RepositoryError> {
        Ok(self.templates.lock().expect("templates mutex").clone())
    }
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<OutboundEmail>>,
    fail_sends: bool,
}

impl RecordingTransport {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_sends: true,
        }
    }

    fn messages(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("sent mutex").clone()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, message: OutboundEmail) -> Result<(), MailError> {
        if self.fail_sends {
            return Err(MailError::Transport("smtp refused".to_string()));
        }
        self.sent.lock().expect("sent mutex").push(message);
        Ok(())
    }
}

type TestService = SubmissionService<MemorySubmissions, MemoryTemplates, RecordingTransport>;

fn service(
    submissions: MemorySubmissions,
    templates: MemoryTemplates,
    mail: RecordingTransport,
) -> (
    Arc<MemorySubmissions>,
    Arc<MemoryTemplates>,
    Arc<RecordingTransport>,
    TestService,
) {
    let submissions = Arc::new(submissions);
    let templates = Arc::new(templates);
    let mail = Arc::new(mail);
    let service = SubmissionService::new(
        Arc::clone(&submissions),
        Arc::clone(&templates),
        Arc::clone(&mail),
        "https://followuphealth.clinic".to_string(),
    );
    (submissions, templates, mail, service)
}

fn typical_inputs() -> CalculatorInputs {
    CalculatorInputs {
        monthly_inquiries: 100,
        response_time: ResponseTime::Within30Min,
        follow_up_depth: FollowUpDepth::TwoToThree,
        patient_value: PatientValue::From250To500,
        after_hours: AfterHoursCoverage::Sometimes,
    }
}

fn worst_inputs() -> CalculatorInputs {
    CalculatorInputs {
        monthly_inquiries: 80,
        response_time: ResponseTime::NextDay,
        follow_up_depth: FollowUpDepth::NotSure,
        patient_value: PatientValue::Over1000,
        after_hours: AfterHoursCoverage::No,
    }
}

#[test]
fn submit_persists_a_recomputed_record() {
    let (submissions, _, _, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    let receipt = service.submit(SubmissionRequest {
        inputs: typical_inputs(),
        email: None,
    });

    assert!(receipt.persisted);
    assert_eq!(receipt.email_status, EmailStatus::NotRequested);
    assert_eq!(receipt.submission.results.grade.to_string(), "B-");
    assert_eq!(receipt.submission.results.dropoff_percent, 9);

    let stored = submissions.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, receipt.submission.id);
    assert_eq!(stored[0].results, receipt.submission.results);
}

#[test]
fn submit_sends_report_with_template_subject_and_placeholders() {
    let (_, _, mail, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    service
        .upsert_template(TemplateDraft {
            grade_range: GradeRange::Bc,
            subject: "Your clinic is leaking revenue".to_string(),
            body: "Grade {{grade}}: ${{risk_low}} to ${{risk_high}} at risk.\nBook at {{cta_url}}"
                .to_string(),
            config: Some(r#"{"cta_url":"https://cal.example/intro"}"#.to_string()),
        })
        .expect("template stored");

    let receipt = service.submit(SubmissionRequest {
        inputs: typical_inputs(),
        email: Some("owner@clinic.example".to_string()),
    });

    assert_eq!(receipt.email_status, EmailStatus::Sent);
    let messages = mail.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to, "owner@clinic.example");
    assert_eq!(messages[0].subject, "Your clinic is leaking revenue");
    assert!(messages[0].html.contains("Grade B-: $2,310 to $4,290 at risk."));
    assert!(messages[0].html.contains("https://cal.example/intro"));
    assert!(messages[0].html.contains("<br>"));
}

#[test]
fn submit_without_template_falls_back_to_default_subject() {
    let (_, _, mail, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    let receipt = service.submit(SubmissionRequest {
        inputs: typical_inputs(),
        email: Some("owner@clinic.example".to_string()),
    });

    assert_eq!(receipt.email_status, EmailStatus::Sent);
    let messages = mail.messages();
    assert_eq!(messages[0].subject, "Your Follow-Up Health Score: B-");
    assert!(messages[0]
        .html
        .contains("This report was generated by the Follow-Up Health Dashboard."));
}

#[test]
fn failed_insert_still_sends_the_report() {
    let (_, _, mail, service) = service(
        MemorySubmissions::failing(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    let receipt = service.submit(SubmissionRequest {
        inputs: typical_inputs(),
        email: Some("owner@clinic.example".to_string()),
    });

    assert!(!receipt.persisted);
    assert_eq!(receipt.email_status, EmailStatus::Sent);
    assert_eq!(mail.messages().len(), 1);
}

#[test]
fn failed_send_still_persists_and_returns_a_receipt() {
    let (submissions, _, _, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::failing(),
    );

    let receipt = service.submit(SubmissionRequest {
        inputs: typical_inputs(),
        email: Some("owner@clinic.example".to_string()),
    });

    assert!(receipt.persisted);
    assert_eq!(receipt.email_status, EmailStatus::Failed);
    assert_eq!(submissions.stored().len(), 1);
}

#[test]
fn admin_update_rederives_results_from_new_inputs() {
    let (_, _, _, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    let created = service.create(worst_inputs(), None).expect("created");
    assert_eq!(created.results.grade.to_string(), "F");

    let updated = service
        .update(
            &created.id,
            CalculatorInputs {
                response_time: ResponseTime::Under5Min,
                follow_up_depth: FollowUpDepth::FourToSix,
                after_hours: AfterHoursCoverage::Yes,
                ..worst_inputs()
            },
            None,
        )
        .expect("updated");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.results.grade.to_string(), "A+");
    assert_eq!(updated.results.grade_score, 100);

    let fetched = service.get(&created.id).expect("fetched");
    assert_eq!(fetched.results.grade.to_string(), "A+");
}

#[test]
fn admin_delete_removes_the_record() {
    let (_, _, _, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    let created = service.create(typical_inputs(), None).expect("created");
    service.delete(&created.id).expect("deleted");

    assert!(matches!(
        service.get(&created.id),
        Err(SubmissionServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn admin_list_filters_by_grade_prefix() {
    let (_, _, _, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    service.create(typical_inputs(), None).expect("created");
    service.create(worst_inputs(), None).expect("created");

    let page = service
        .list(
            &SubmissionFilter {
                grade_prefix: Some("B".to_string()),
                ..SubmissionFilter::default()
            },
            PageRequest::default(),
        )
        .expect("listed");

    assert_eq!(page.total, 1);
    assert_eq!(page.submissions[0].results.grade.to_string(), "B-");
}

#[test]
fn blank_template_fields_are_rejected() {
    let (_, templates, _, service) = service(
        MemorySubmissions::default(),
        MemoryTemplates::default(),
        RecordingTransport::default(),
    );

    let result = service.upsert_template(TemplateDraft {
        grade_range: GradeRange::A,
        subject: "   ".to_string(),
        body: "body".to_string(),
        config: None,
    });
    assert!(matches!(
        result,
        Err(SubmissionServiceError::InvalidTemplate(_))
    ));

    let result = service.upsert_template(TemplateDraft {
        grade_range: GradeRange::A,
        subject: "subject".to_string(),
        body: "".to_string(),
        config: None,
    });
    assert!(matches!(
        result,
        Err(SubmissionServiceError::InvalidTemplate(_))
    ));

    assert!(templates.list().expect("list").is_empty());
}
