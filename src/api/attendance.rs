use chrono::{Datelike, NaiveDateTime};
use derive_more::Display;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    model::attendance::{MonthlyRecord, YearMonth, record_key},
    models::ResponseEnvelope,
    notify::{Notifier, push_best_effort},
    store::{StoreError, TimecardStore},
    utils::report,
};

/// Failures that end the conversation. `Display` is the spoken text.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq)]
pub enum SkillError {
    #[display(fmt = "今日の出勤はすでに記録されています。")]
    AlreadyPunchedIn,
    #[display(fmt = "今日の出勤が記録されていません。")]
    NotPunchedIn,
    #[display(fmt = "今月の出勤は記録されていません。")]
    NoRecordThisMonth,
    #[display(fmt = "先月の出勤は記録されていません。")]
    NoRecordLastMonth,
    #[display(fmt = "他の操作と重なりました。もう一度お試しください。")]
    Conflict,
    #[display(fmt = "処理異常が発生しました。")]
    Store,
}

/// Long-lived handles shared by every request.
#[derive(Clone)]
pub struct Skill {
    store: Arc<dyn TimecardStore>,
    notifier: Arc<dyn Notifier>,
}

impl Skill {
    pub fn new(store: Arc<dyn TimecardStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// `Ok(None)` when the month has no record yet.
    async fn load(&self, key: &str) -> Result<Option<MonthlyRecord>, SkillError> {
        match self.store.get(key).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => {
                error!(error = %e, key, "timecard get failed");
                Err(SkillError::Store)
            }
        }
    }

    async fn save(&self, record: &MonthlyRecord) -> Result<(), SkillError> {
        match self.store.put(record).await {
            Ok(_) => Ok(()),
            Err(StoreError::Conflict(key)) => {
                warn!(key = %key, "timecard put lost a concurrent update");
                Err(SkillError::Conflict)
            }
            Err(e) => {
                error!(error = %e, key = %record.key, "timecard put failed");
                Err(SkillError::Store)
            }
        }
    }

    async fn notify(&self, user_id: &str, text: &str) {
        push_best_effort(self.notifier.as_ref(), user_id, text).await;
    }
}

#[instrument(name = "punch_in", skip(skill))]
pub async fn punch_in(
    skill: &Skill,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<ResponseEnvelope, SkillError> {
    let key = record_key(user_id, YearMonth::of(now));
    let mut record = skill
        .load(&key)
        .await?
        .unwrap_or_else(|| MonthlyRecord::new(key.clone()));

    if !record.punch_in(now) {
        info!(key = %key, "already punched in today");
        return Err(SkillError::AlreadyPunchedIn);
    }

    skill.save(&record).await?;
    info!(key = %key, "punched in");

    skill
        .notify(user_id, &format!("出勤 {}", report::timestamp(now)))
        .await;
    Ok(ResponseEnvelope::end("出勤記録しました。"))
}

#[instrument(name = "punch_out", skip(skill))]
pub async fn punch_out(
    skill: &Skill,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<ResponseEnvelope, SkillError> {
    let key = record_key(user_id, YearMonth::of(now));
    let mut record = skill.load(&key).await?.ok_or(SkillError::NotPunchedIn)?;

    let worked = record.punch_out(now).ok_or(SkillError::NotPunchedIn)?;
    skill.save(&record).await?;

    let worked = report::hours_minutes(worked.num_minutes());
    info!(key = %key, worked = %worked, "punched out");

    skill
        .notify(
            user_id,
            &format!("退勤 {}\n勤務時間{}", report::timestamp(now), worked),
        )
        .await;
    Ok(ResponseEnvelope::end(format!(
        "退勤記録しました。 勤務時間は{}でした。",
        worked
    )))
}

/// Time since today's punch-in. Never writes.
#[instrument(name = "get_duration", skip(skill))]
pub async fn get_duration(
    skill: &Skill,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<ResponseEnvelope, SkillError> {
    let key = record_key(user_id, YearMonth::of(now));
    let record = skill.load(&key).await?.ok_or(SkillError::NotPunchedIn)?;
    let entry = record.entry(now.day()).ok_or(SkillError::NotPunchedIn)?;

    let elapsed = (now - entry.punch_in).num_minutes();
    Ok(ResponseEnvelope::end(format!(
        "今日の現在までの勤務時間は{}です。",
        report::hours_minutes(elapsed)
    )))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ReportPeriod {
    ThisMonth,
    LastMonth,
}

impl ReportPeriod {
    fn month(self, now: NaiveDateTime) -> YearMonth {
        match self {
            ReportPeriod::ThisMonth => YearMonth::of(now),
            ReportPeriod::LastMonth => YearMonth::of(now).previous(),
        }
    }

    fn not_found(self) -> SkillError {
        match self {
            ReportPeriod::ThisMonth => SkillError::NoRecordThisMonth,
            ReportPeriod::LastMonth => SkillError::NoRecordLastMonth,
        }
    }

    fn days_label(self) -> &'static str {
        match self {
            ReportPeriod::ThisMonth => "出勤日数(昨日まで)",
            ReportPeriod::LastMonth => "出勤日数",
        }
    }

    fn sent_only(self) -> &'static str {
        match self {
            ReportPeriod::ThisMonth => "今月の出勤記録をLINEにお送りしました。",
            ReportPeriod::LastMonth => "先月の出勤記録をLINEにお送りしました。",
        }
    }

    fn totals_prefix(self) -> &'static str {
        match self {
            ReportPeriod::ThisMonth => "今月の昨日までの",
            ReportPeriod::LastMonth => "先月の",
        }
    }
}

/// Sends the month's day-by-day report to the chat channel and speaks the
/// totals. Read-only.
async fn monthly_report(
    skill: &Skill,
    user_id: &str,
    now: NaiveDateTime,
    period: ReportPeriod,
) -> Result<ResponseEnvelope, SkillError> {
    let month = period.month(now);
    let key = record_key(user_id, month);
    let record = skill.load(&key).await?.ok_or_else(|| period.not_found())?;

    let summary = record.summarize(now.date());
    let mut text = report::monthly_report(month, &record);
    text.push_str(&report::summary_lines(&summary, period.days_label()));
    skill.notify(user_id, &text).await;

    let Some(average) = summary.average_minutes() else {
        return Ok(ResponseEnvelope::end(period.sent_only()));
    };

    Ok(ResponseEnvelope::end(format!(
        "{}総勤務時間は{}です。1日平均は{}です。詳細な記録はLINEにお送りしました。",
        period.totals_prefix(),
        report::hours_minutes(summary.total_minutes),
        report::hours_minutes(average)
    )))
}

#[instrument(name = "get_this_month", skip(skill))]
pub async fn get_this_month(
    skill: &Skill,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<ResponseEnvelope, SkillError> {
    monthly_report(skill, user_id, now, ReportPeriod::ThisMonth).await
}

#[instrument(name = "get_last_month", skip(skill))]
pub async fn get_last_month(
    skill: &Skill,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<ResponseEnvelope, SkillError> {
    monthly_report(skill, user_id, now, ReportPeriod::LastMonth).await
}
