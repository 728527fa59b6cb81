use strum_macros::EnumString;

/// Intents the skill understands, keyed by the platform's intent name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, EnumString)]
pub enum Intent {
    #[strum(serialize = "PunchInIntent")]
    PunchIn,
    #[strum(serialize = "PunchOutIntent")]
    PunchOut,
    #[strum(serialize = "GetDurationIntent")]
    GetDuration,
    #[strum(serialize = "GetThisMonthIntent")]
    GetThisMonth,
    #[strum(serialize = "GetLastMonthIntent")]
    GetLastMonth,
    #[strum(disabled)]
    Unknown,
}

impl Intent {
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(Intent::Unknown)
    }
}
