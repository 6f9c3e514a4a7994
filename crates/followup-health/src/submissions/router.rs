use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::domain::SubmissionId;
use super::repository::{
    MailTransport, PageRequest, RepositoryError, SubmissionFilter, SubmissionRepository,
    TemplateRepository,
};
use super::service::{SubmissionRequest, SubmissionService, SubmissionServiceError, TemplateDraft};
use crate::drivers::{top_drivers, Driver};
use crate::scoring::{calculate_results, CalculationResults, CalculatorInputs};

/// Router builder exposing the calculator and admin-console endpoints.
///
/// Session auth for the `/admin` prefix is middleware mounted by the
/// host application, not a concern of this router.
pub fn submission_router<S, T, M>(service: Arc<SubmissionService<S, T, M>>) -> Router
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    Router::new()
        .route("/api/v1/score", post(score_handler))
        .route("/api/v1/submissions", post(submit_handler::<S, T, M>))
        .route(
            "/api/v1/admin/submissions",
            get(list_submissions_handler::<S, T, M>).post(create_submission_handler::<S, T, M>),
        )
        .route(
            "/api/v1/admin/submissions/:submission_id",
            get(get_submission_handler::<S, T, M>)
                .put(update_submission_handler::<S, T, M>)
                .delete(delete_submission_handler::<S, T, M>),
        )
        .route(
            "/api/v1/admin/templates",
            get(list_templates_handler::<S, T, M>).put(upsert_template_handler::<S, T, M>),
        )
        .with_state(service)
}

/// Live calculation for the interactive dashboard; nothing is persisted.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub results: CalculationResults,
    pub drivers: [Driver; 3],
}

pub(crate) async fn score_handler(
    axum::Json(inputs): axum::Json<CalculatorInputs>,
) -> axum::Json<ScoreResponse> {
    axum::Json(ScoreResponse {
        results: calculate_results(&inputs),
        drivers: top_drivers(&inputs),
    })
}

pub(crate) async fn submit_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    let receipt = service.submit(request);
    (StatusCode::OK, axum::Json(receipt)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    has_email: Option<bool>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

pub(crate) async fn list_submissions_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page).max(1),
        limit: query.limit.unwrap_or(defaults.limit).max(1),
    };
    let filter = SubmissionFilter {
        grade_prefix: query.grade,
        has_email: query.has_email,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    match service.list(&filter, page) {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionUpsertRequest {
    inputs: CalculatorInputs,
    #[serde(default)]
    email: Option<String>,
}

pub(crate) async fn create_submission_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    axum::Json(request): axum::Json<SubmissionUpsertRequest>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    match service.create(request.inputs, request.email) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_submission_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    Path(submission_id): Path<Uuid>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    match service.get(&SubmissionId(submission_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_submission_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    Path(submission_id): Path<Uuid>,
    axum::Json(request): axum::Json<SubmissionUpsertRequest>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    match service.update(&SubmissionId(submission_id), request.inputs, request.email) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_submission_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    Path(submission_id): Path<Uuid>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    match service.delete(&SubmissionId(submission_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_templates_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    match service.templates() {
        Ok(templates) => {
            (StatusCode::OK, axum::Json(json!({ "templates": templates }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upsert_template_handler<S, T, M>(
    State(service): State<Arc<SubmissionService<S, T, M>>>,
    axum::Json(draft): axum::Json<TemplateDraft>,
) -> Response
where
    S: SubmissionRepository + 'static,
    T: TemplateRepository + 'static,
    M: MailTransport + 'static,
{
    match service.upsert_template(draft) {
        Ok(template) => (StatusCode::OK, axum::Json(template)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: SubmissionServiceError) -> Response {
    let status = match &err {
        SubmissionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SubmissionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SubmissionServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SubmissionServiceError::InvalidTemplate(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
