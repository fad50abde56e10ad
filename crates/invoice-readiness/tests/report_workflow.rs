use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use invoice_readiness::analysis::AnalysisContext;
use invoice_readiness::reports::{
    readiness_router, AnalyzeRequest, InMemoryReportRepository, ReadinessService, ReportRepository,
    UploadSubmission,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn service() -> Arc<ReadinessService<InMemoryReportRepository>> {
    let context = Arc::new(AnalysisContext::load(None).expect("bundled schema loads"));
    Arc::new(ReadinessService::new(
        context,
        Arc::new(InMemoryReportRepository::new()),
    ))
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&body).expect("json payload"))
}

#[tokio::test]
async fn erp_export_flows_from_upload_to_listing() {
    let router = readiness_router(service());

    let (status, upload) = send(
        &router,
        Request::post("/upload")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(include_str!("fixtures/erp_export.csv")))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let upload_id = upload["uploadId"].as_str().expect("upload id").to_string();

    let (status, preview) = send(
        &router,
        Request::get(format!("/upload/{upload_id}/preview"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["columns"][0], "Invoice Number");
    assert_eq!(preview["rows"].as_array().map(Vec::len), Some(3));

    let (status, report) = send(
        &router,
        Request::post("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "uploadId": upload_id,
                    "questionnaire": { "webhooks": true, "sandbox_env": true, "retries": true }
                })
                .to_string(),
            ))
            .expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["scores"]["posture"], 100);
    assert_eq!(report["meta"]["rowsParsed"], 3);
    assert_eq!(
        report["ruleFindings"][3],
        json!({ "rule": "CURRENCY_ALLOWED", "ok": false, "value": null })
    );
    assert!(report["gaps"]
        .as_array()
        .expect("gaps")
        .contains(&json!("Invalid currency null")));

    let (status, listing) = send(
        &router,
        Request::get("/reports").body(Body::empty()).expect("request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing[0]["id"], report["reportId"]);
    assert_eq!(listing[0]["overall"], report["scores"]["overall"]);
}

#[test]
fn service_api_is_usable_without_http() {
    let repository = Arc::new(InMemoryReportRepository::new());
    let context = Arc::new(AnalysisContext::load(None).expect("bundled schema loads"));
    let service = ReadinessService::new(context, repository.clone());

    let upload = service
        .upload(UploadSubmission::from_text(
            r#"{"invoice":{"currency":"SAR","issue_date":"2025-01-01"}}"#,
        ))
        .expect("upload stored");
    let report = service
        .analyze(AnalyzeRequest {
            upload_id: Some(upload.id.0.clone()),
            questionnaire: None,
        })
        .expect("analysis succeeds");

    assert_eq!(repository.backend(), "memory");
    let stored = repository
        .fetch_report(&report.report_id)
        .expect("repository available")
        .expect("report stored");
    assert_eq!(stored.overall, report.scores.overall);
    assert_eq!(service.recent(None).expect("listing").len(), 1);
}
