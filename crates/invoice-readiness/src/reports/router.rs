use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::domain::{AnalyzeRequest, ReportId, UploadId, UploadSubmission};
use super::repository::ReportRepository;
use super::service::{MissingResource, ReadinessService, ReportServiceError, ValidationError};

/// Router builder exposing the upload, analysis, and report endpoints.
pub fn readiness_router<R>(service: Arc<ReadinessService<R>>) -> Router
where
    R: ReportRepository + 'static,
{
    Router::new()
        .route("/upload", post(upload_handler::<R>))
        .route("/upload/:upload_id/preview", get(preview_handler::<R>))
        .route("/analyze", post(analyze_handler::<R>))
        .route("/report/:report_id", get(report_handler::<R>))
        .route("/reports", get(recent_handler::<R>))
        .with_state(service)
}

impl IntoResponse for ReportServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReportServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ReportServiceError::NotFound(MissingResource::Upload(_))
            | ReportServiceError::NotFound(MissingResource::Report(_)) => StatusCode::NOT_FOUND,
            ReportServiceError::Storage(source) => {
                error!(error = %source, "report storage failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.code() }))).into_response()
    }
}

/// How an upload request carries its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadBody {
    Json,
    Multipart,
    Text,
    Unsupported,
}

impl UploadBody {
    fn from_headers(headers: &HeaderMap) -> Self {
        let Some(content_type) = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
        else {
            return Self::Unsupported;
        };

        match (content_type.type_(), content_type.subtype()) {
            (mime::APPLICATION, mime::JSON) => Self::Json,
            (mime::MULTIPART, mime::FORM_DATA) => Self::Multipart,
            (mime::TEXT, mime::CSV) | (mime::TEXT, mime::PLAIN) => Self::Text,
            _ => Self::Unsupported,
        }
    }
}

pub(crate) async fn upload_handler<R>(
    State(service): State<Arc<ReadinessService<R>>>,
    request: Request,
) -> Response
where
    R: ReportRepository + 'static,
{
    let submission = match UploadBody::from_headers(request.headers()) {
        UploadBody::Json => match Json::<UploadSubmission>::from_request(request, &()).await {
            Ok(Json(submission)) => submission,
            Err(rejection) => {
                warn!(error = %rejection, "unreadable json upload");
                return ReportServiceError::from(ValidationError::NoInput).into_response();
            }
        },
        UploadBody::Multipart => match Multipart::from_request(request, &()).await {
            Ok(multipart) => match read_multipart(multipart).await {
                Ok(submission) => submission,
                Err(response) => return response,
            },
            Err(rejection) => return rejection.into_response(),
        },
        UploadBody::Text => match String::from_request(request, &()).await {
            Ok(text) => UploadSubmission::from_text(text),
            Err(rejection) => return rejection.into_response(),
        },
        UploadBody::Unsupported => UploadSubmission::default(),
    };

    match service.upload(submission) {
        Ok(upload) => (StatusCode::OK, Json(json!({ "uploadId": upload.id }))).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadSubmission, Response> {
    let mut submission = UploadSubmission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(rejection) => return Err(rejection.into_response()),
        };

        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(IntoResponse::into_response)?;
        match name.as_str() {
            "file" => submission.text = Some(value),
            "country" => submission.country = Some(value),
            "erp" => submission.erp = Some(value),
            _ => {}
        }
    }

    Ok(submission)
}

pub(crate) async fn analyze_handler<R>(
    State(service): State<Arc<ReadinessService<R>>>,
    body: Bytes,
) -> Response
where
    R: ReportRepository + 'static,
{
    // An unreadable body is treated like one without an upload id.
    let request: AnalyzeRequest = serde_json::from_slice(&body).unwrap_or_default();

    match service.analyze(request) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn report_handler<R>(
    State(service): State<Arc<ReadinessService<R>>>,
    Path(report_id): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.report(&ReportId(report_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecentQuery {
    limit: Option<usize>,
}

pub(crate) async fn recent_handler<R>(
    State(service): State<Arc<ReadinessService<R>>>,
    Query(query): Query<RecentQuery>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.recent(query.limit) {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<ReadinessService<R>>>,
    Path(upload_id): Path<String>,
) -> Response
where
    R: ReportRepository + 'static,
{
    match service.preview(&UploadId(upload_id)) {
        Ok(table) => (StatusCode::OK, Json(table)).into_response(),
        Err(error) => error.into_response(),
    }
}
