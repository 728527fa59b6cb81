use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar month addressed by a monthly record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month before this one, rolling the year back from January.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Report header, e.g. `2024年03月`.
    pub fn label(self) -> String {
        format!("{:04}年{:02}月", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Composite store key: `<userID>-<YYYY-MM>`.
pub fn record_key(user_id: &str, month: YearMonth) -> String {
    format!("{}-{}", user_id, month)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: u32,
    pub punch_in: NaiveDateTime,
    /// `None` until the user punches out
    #[serde(default)]
    pub punch_out: Option<NaiveDateTime>,
}

impl DayEntry {
    pub fn open(at: NaiveDateTime) -> Self {
        Self {
            day: at.day(),
            punch_in: at,
            punch_out: None,
        }
    }

    /// Whole minutes between punch-in and punch-out, if punched out.
    pub fn worked_minutes(&self) -> Option<i64> {
        self.punch_out
            .map(|out| (out - self.punch_in).num_minutes())
    }
}

/// One user's attendance for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRecord {
    pub key: String,
    pub entries: Vec<DayEntry>,
    /// Write counter for conditional puts; 0 means never persisted.
    pub version: u64,
}

impl MonthlyRecord {
    pub fn new(key: String) -> Self {
        Self {
            key,
            entries: Vec::new(),
            version: 0,
        }
    }

    pub fn entry(&self, day: u32) -> Option<&DayEntry> {
        self.entries.iter().find(|e| e.day == day)
    }

    /// Appends an open entry for `at`'s day.
    ///
    /// Returns `false` without touching the record when that day already
    /// has an entry.
    pub fn punch_in(&mut self, at: NaiveDateTime) -> bool {
        if self.entry(at.day()).is_some() {
            return false;
        }
        self.entries.push(DayEntry::open(at));
        true
    }

    /// Closes the entry for `at`'s day and returns the time worked.
    ///
    /// Returns `None` when there is no entry for that day.
    pub fn punch_out(&mut self, at: NaiveDateTime) -> Option<Duration> {
        let entry = self.entries.iter_mut().find(|e| e.day == at.day())?;
        entry.punch_out = Some(at);
        Some(at - entry.punch_in)
    }

    /// Aggregates closed entries dated strictly before `today`.
    ///
    /// Open entries and today's entry are listed in reports but never
    /// counted here.
    pub fn summarize(&self, today: NaiveDate) -> MonthlySummary {
        self.entries
            .iter()
            .filter(|e| e.punch_in.date() < today)
            .filter_map(DayEntry::worked_minutes)
            .fold(MonthlySummary::default(), |acc, minutes| MonthlySummary {
                working_days: acc.working_days + 1,
                total_minutes: acc.total_minutes + minutes,
            })
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MonthlySummary {
    pub working_days: i64,
    pub total_minutes: i64,
}

impl MonthlySummary {
    pub fn average_minutes(&self) -> Option<i64> {
        (self.working_days > 0).then(|| self.total_minutes / self.working_days)
    }
}
