use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub const SPEECH_LANG: &str = "ja";

// ---- inbound ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub session: Session,
    #[serde(default)]
    pub context: Option<Context>,
    pub request: RequestBody,
}

impl RequestEnvelope {
    pub fn application_id(&self) -> Option<&str> {
        self.context
            .as_ref()
            .map(|c| c.system.application.application_id.as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub session_attributes: Map<String, Value>,
    pub user: SessionUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Context {
    #[serde(rename = "System")]
    pub system: SystemContext,
}

#[derive(Debug, Deserialize)]
pub struct SystemContext {
    pub application: Application,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum RequestBody {
    LaunchRequest,
    IntentRequest { intent: IntentInfo },
    SessionEndedRequest,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct IntentInfo {
    pub name: String,
}

// ---- outbound ----

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[schema(example = "1.0")]
    pub version: String,
    #[schema(value_type = Object)]
    pub session_attributes: Map<String, Value>,
    pub response: SkillResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub output_speech: OutputSpeech,
    #[schema(value_type = Object)]
    pub card: Value,
    #[schema(value_type = Vec<Object>)]
    pub directives: Vec<Value>,
    pub should_end_session: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    #[schema(example = "SimpleSpeech")]
    pub kind: String,
    pub values: SpeechValue,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SpeechValue {
    #[serde(rename = "type")]
    #[schema(example = "PlainText")]
    pub kind: String,
    #[schema(example = "ja")]
    pub lang: String,
    #[schema(example = "出勤記録しました。")]
    pub value: String,
}

impl ResponseEnvelope {
    fn speech(
        text: impl Into<String>,
        session_attributes: Map<String, Value>,
        should_end_session: bool,
    ) -> Self {
        Self {
            version: "1.0".to_string(),
            session_attributes,
            response: SkillResponse {
                output_speech: OutputSpeech {
                    kind: "SimpleSpeech".to_string(),
                    values: SpeechValue {
                        kind: "PlainText".to_string(),
                        lang: SPEECH_LANG.to_string(),
                        value: text.into(),
                    },
                },
                card: Value::Object(Map::new()),
                directives: Vec::new(),
                should_end_session,
            },
        }
    }

    /// Speaks `text` and closes the session.
    pub fn end(text: impl Into<String>) -> Self {
        Self::speech(text, Map::new(), true)
    }

    /// Speaks `text` and keeps the session open, echoing its attributes.
    pub fn resume(text: impl Into<String>, session_attributes: Map<String, Value>) -> Self {
        Self::speech(text, session_attributes, false)
    }

    pub fn text(&self) -> &str {
        &self.response.output_speech.values.value
    }

    pub fn ends_session(&self) -> bool {
        self.response.should_end_session
    }
}
