use chrono::NaiveDateTime;

use crate::model::attendance::{DayEntry, MonthlyRecord, MonthlySummary, YearMonth};

/// `540` -> `9時間0分`
pub fn hours_minutes(minutes: i64) -> String {
    format!("{}時間{}分", minutes / 60, minutes % 60)
}

/// Timestamp used in push notifications.
pub fn timestamp(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn clock(t: NaiveDateTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn day_line(entry: &DayEntry) -> String {
    match entry.punch_out {
        Some(out) => format!(
            "{}日 出社: {} 退社: {}",
            entry.day,
            clock(entry.punch_in),
            clock(out)
        ),
        None => format!("{}日 出社: {}", entry.day, clock(entry.punch_in)),
    }
}

/// Month header followed by one line per recorded day.
pub fn monthly_report(month: YearMonth, record: &MonthlyRecord) -> String {
    let mut report = month.label();
    for entry in &record.entries {
        report.push('\n');
        report.push_str(&day_line(entry));
    }
    report
}

/// Totals appended to a monthly report. Empty when no day qualified.
pub fn summary_lines(summary: &MonthlySummary, days_label: &str) -> String {
    let Some(average) = summary.average_minutes() else {
        return String::new();
    };
    format!(
        "\n{}: {}日\n総勤務時間:{}\n1日平均: {}",
        days_label,
        summary.working_days,
        hours_minutes(summary.total_minutes),
        hours_minutes(average)
    )
}
