use chrono::NaiveDateTime;
use tracing::debug;

use crate::{
    api::attendance::{self, Skill},
    model::intent::Intent,
    models::{RequestBody, RequestEnvelope, ResponseEnvelope, Session},
};

pub const LAUNCH_PROMPT: &str =
    "タイムカードです。出社記録、退社記録、経過時間、今月の記録、先月の記録から選んでください。";
pub const GOODBYE: &str = "タイムカード終了します。";
pub const PLEASE_REPEAT: &str = "すみません、もう一度言ってください。";

/// Routes a parsed request to its handler by request type.
pub async fn dispatch(
    skill: &Skill,
    envelope: RequestEnvelope,
    now: NaiveDateTime,
) -> ResponseEnvelope {
    let RequestEnvelope {
        session, request, ..
    } = envelope;

    match request {
        RequestBody::IntentRequest { intent } => {
            handle_intent_request(skill, Intent::from_name(&intent.name), session, now).await
        }
        RequestBody::LaunchRequest => {
            ResponseEnvelope::resume(LAUNCH_PROMPT, session.session_attributes)
        }
        RequestBody::SessionEndedRequest => ResponseEnvelope::end(GOODBYE),
        RequestBody::Unknown => {
            debug!("unrecognized request type");
            ResponseEnvelope::resume(PLEASE_REPEAT, session.session_attributes)
        }
    }
}

async fn handle_intent_request(
    skill: &Skill,
    intent: Intent,
    session: Session,
    now: NaiveDateTime,
) -> ResponseEnvelope {
    let user_id = session.user.user_id.as_str();

    let result = match intent {
        Intent::PunchIn => attendance::punch_in(skill, user_id, now).await,
        Intent::PunchOut => attendance::punch_out(skill, user_id, now).await,
        Intent::GetDuration => attendance::get_duration(skill, user_id, now).await,
        Intent::GetThisMonth => attendance::get_this_month(skill, user_id, now).await,
        Intent::GetLastMonth => attendance::get_last_month(skill, user_id, now).await,
        Intent::Unknown => {
            debug!("unrecognized intent");
            return ResponseEnvelope::resume(PLEASE_REPEAT, session.session_attributes);
        }
    };

    result.unwrap_or_else(|e| ResponseEnvelope::end(e.to_string()))
}
