use actix_web::{
    HttpRequest, HttpResponse, error::ErrorBadRequest, error::ErrorInternalServerError, web,
};
use tracing::{Span, info, instrument, warn};

use crate::{
    api::{
        attendance::Skill,
        clock::Now,
        dispatch::dispatch,
        signature::{SIGNATURE_HEADER, SignatureCheck},
    },
    config::Config,
    models::RequestEnvelope,
};

/// Clova extension endpoint
#[utoipa::path(
    post,
    path = "/clova",
    request_body(
        content = Object,
        description = "Clova Extension Kit request envelope",
        example = json!({
            "version": "1.0",
            "session": {
                "sessionId": "a29cfead-c5ba-474d-8745-6c1a6625f0c5",
                "new": false,
                "sessionAttributes": {},
                "user": {"userId": "U399a1e08a8d474521fc4bbd8c7b4148f"}
            },
            "context": {
                "System": {"application": {"applicationId": "com.example.timecard"}}
            },
            "request": {"type": "IntentRequest", "intent": {"name": "PunchInIntent"}}
        })
    ),
    params(
        ("SignatureCEK" = String, Header, description = "Base64 RSA-SHA256 signature of the body")
    ),
    responses(
        (status = 200, description = "Speech response", body = crate::models::ResponseEnvelope),
        (status = 400, description = "Bad SignatureCEK, malformed envelope or foreign application id"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Clova"
)]
#[instrument(
    name = "clova_webhook",
    skip_all,
    fields(request_id = %uuid::Uuid::new_v4(), session_id = tracing::field::Empty)
)]
pub async fn clova_webhook(
    req: HttpRequest,
    body: web::Bytes,
    skill: web::Data<Skill>,
    config: web::Data<Config>,
    signatures: web::Data<SignatureCheck>,
    now: Now,
) -> actix_web::Result<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());
    if let Err(e) = signatures.check(signature, &body) {
        warn!(error = %e, "request signature rejected");
        return Err(ErrorBadRequest("Invalid request signature"));
    }

    let envelope: RequestEnvelope = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "invalid request");
        ErrorBadRequest("Malformed request")
    })?;
    Span::current().record("session_id", envelope.session.session_id.as_str());

    if let Some(expected) = config.application_id.as_deref() {
        if envelope.application_id() != Some(expected) {
            warn!(
                application_id = ?envelope.application_id(),
                "request for another application"
            );
            return Err(ErrorBadRequest("Invalid application id"));
        }
    }

    if envelope.session.user.user_id.trim().is_empty() {
        warn!("request without user id");
        return Err(ErrorBadRequest("Missing user id"));
    }

    info!(new_session = envelope.session.new, "request received");

    let response = dispatch(skill.get_ref(), envelope, now.0).await;

    let body = serde_json::to_vec(&response).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize response");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json;charset=UTF-8")
        .body(body))
}

/// Liveness check
#[utoipa::path(get, path = "/health", responses((status = 200, body = String)), tag = "Clova")]
pub async fn health() -> &'static str {
    "ok"
}
