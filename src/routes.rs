use crate::{api::webhook, config::Config};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use tracing::warn;

// Per-IP limiter for the webhook
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            warn!(requests_per_min, "invalid rate limit, using defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // The webhook reads the raw body; the signature covers the exact bytes
    let payload_config = web::PayloadConfig::new(64 * 1024);

    cfg.service(web::resource("/health").route(web::get().to(webhook::health)));

    // The platform posts to the extension root; /clova is kept as an alias
    cfg.service(
        web::scope("")
            .app_data(payload_config)
            .wrap(build_limiter(config.rate_webhook_per_min))
            .service(web::resource("/").route(web::post().to(webhook::clova_webhook)))
            .service(web::resource("/clova").route(web::post().to(webhook::clova_webhook))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::attendance::{Skill, tests::at};
    use crate::api::clock::Clock;
    use crate::api::signature::{
        SIGNATURE_HEADER, SignatureCheck,
        tests::{PUBLIC_KEY, sign},
    };
    use crate::notify::recording::RecordingNotifier;
    use crate::store::memory::MemoryStore;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn config(application_id: Option<&str>) -> Config {
        Config {
            server_addr: "127.0.0.1:0".into(),
            database_url: "mysql://unused".into(),
            table: "timecard".into(),
            application_id: application_id.map(str::to_string),
            cek_public_key_path: None,
            cek_public_key_url: "http://localhost/key.pem".into(),
            skip_signature_check: false,
            channel_access_token: None,
            line_api_base: "http://localhost".into(),
            rate_webhook_per_min: 600,
            log_level: tracing::Level::DEBUG,
        }
    }

    fn body(application_id: &str, intent: &str) -> Value {
        body_for("U1", application_id, intent)
    }

    fn body_for(user_id: &str, application_id: &str, intent: &str) -> Value {
        json!({
            "version": "1.0",
            "session": {
                "sessionId": "s-1",
                "new": true,
                "sessionAttributes": {},
                "user": {"userId": user_id}
            },
            "context": {"System": {"application": {"applicationId": application_id}}},
            "request": {"type": "IntentRequest", "intent": {"name": intent}}
        })
    }

    macro_rules! app {
        ($store:expr, $config:expr) => {
            app!($store, $config, SignatureCheck::from_pem(PUBLIC_KEY).unwrap())
        };
        ($store:expr, $config:expr, $signatures:expr) => {{
            let config = $config;
            let skill = Skill::new($store.clone(), Arc::new(RecordingNotifier::default()));
            test::init_service(
                App::new()
                    .app_data(Data::new(skill))
                    .app_data(Data::new(config.clone()))
                    .app_data(Data::new($signatures))
                    .app_data(Data::new(Clock::fixed(at(2024, 3, 5, 9, 0))))
                    .configure(|cfg| configure(cfg, &config)),
            )
            .await
        }};
    }

    fn post(uri: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .insert_header(("content-type", "application/json"))
    }

    fn signed_payload(uri: &str, payload: &str) -> test::TestRequest {
        post(uri)
            .insert_header((SIGNATURE_HEADER, sign(payload.as_bytes())))
            .set_payload(payload.to_string())
    }

    fn signed_post(uri: &str, body: &Value) -> test::TestRequest {
        signed_payload(uri, &body.to_string())
    }

    #[actix_web::test]
    async fn punch_in_over_http() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(Some("com.example.timecard")));

        let req = signed_post("/", &body("com.example.timecard", "PunchInIntent")).to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["response"]["outputSpeech"]["values"]["value"], "出勤記録しました。");
        assert_eq!(resp["response"]["shouldEndSession"], true);
        assert_eq!(store.record("U1-2024-03").unwrap().entries.len(), 1);
    }

    #[actix_web::test]
    async fn clova_alias_route() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(None));

        let req = signed_post("/clova", &body("anything", "GetDurationIntent")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unsigned_request_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(None));

        let req = post("/")
            .set_payload(body_for("Uvictim", "anything", "PunchInIntent").to_string())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.puts(), 0);
        assert!(store.record("Uvictim-2024-03").is_none());
    }

    #[actix_web::test]
    async fn forged_signature_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(None));

        // Signature of a different body
        let signed = body("anything", "PunchInIntent").to_string();
        let forged = body_for("Uvictim", "anything", "PunchInIntent").to_string();
        let req = post("/")
            .insert_header((SIGNATURE_HEADER, sign(signed.as_bytes())))
            .set_payload(forged)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = post("/")
            .insert_header((SIGNATURE_HEADER, "bm90IGEgc2lnbmF0dXJl"))
            .set_payload(signed)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(store.puts(), 0);
    }

    #[actix_web::test]
    async fn disabled_check_accepts_unsigned_request() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(None), SignatureCheck::Disabled);

        let req = post("/")
            .set_payload(body("anything", "PunchInIntent").to_string())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(store.record("U1-2024-03").unwrap().entries.len(), 1);
    }

    #[actix_web::test]
    async fn foreign_application_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(Some("com.example.timecard")));

        let req = signed_post("/", &body("com.example.other", "PunchInIntent")).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.puts(), 0);
    }

    #[actix_web::test]
    async fn malformed_envelope_is_bad_request() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(None));

        let req = signed_payload("/", "{\"session\": {}}").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = signed_payload("/", "not json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn webhook_is_rate_limited_per_ip() {
        let store = Arc::new(MemoryStore::default());
        let mut config = config(None);
        config.rate_webhook_per_min = 1;
        let app = app!(store, config);

        let payload = body("anything", "GetDurationIntent");
        let resp = test::call_service(&app, signed_post("/", &payload).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, signed_post("/", &payload).to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn health_is_unthrottled() {
        let store = Arc::new(MemoryStore::default());
        let app = app!(store, config(None));

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
