use crate::models::{OutputSpeech, ResponseEnvelope, SkillResponse, SpeechValue};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Time Card Skill API",
        version = "1.0.0",
        description = r#"
## Time Card voice skill

Extension endpoint for a Clova voice skill that works as a punch clock.

### Intents
- **PunchInIntent** records today's start time
- **PunchOutIntent** records today's end time and reports hours worked
- **GetDurationIntent** reports time since today's punch-in
- **GetThisMonthIntent** / **GetLastMonthIntent** send a monthly report to LINE

Records are kept per user and month. Detailed reports are pushed through the
LINE Messaging API when a channel access token is configured.
"#,
    ),
    paths(
        crate::api::webhook::clova_webhook,
        crate::api::webhook::health
    ),
    components(
        schemas(
            ResponseEnvelope,
            SkillResponse,
            OutputSpeech,
            SpeechValue
        )
    ),
    tags(
        (name = "Clova", description = "Voice skill extension endpoint"),
    )
)]
pub struct ApiDoc;
