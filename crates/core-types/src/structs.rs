use crate::enums::PeriodKind;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One user's aggregated meeting activity for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub user_id: String,
    /// e.g. "9月" for a month, "10.20-10.26" for a week.
    pub period_id: String,
    pub period_kind: PeriodKind,
    pub meetings_per_day: f64,
    pub meeting_minutes_per_day: f64,
    pub instant_meetings: u32,
    pub scheduled_meetings: u32,
    pub one_on_one_calls: u32,
    /// Must equal `instant_meetings + scheduled_meetings + one_on_one_calls`.
    pub total_meetings: u32,
}

impl Record {
    /// The period this record belongs to.
    pub fn period(&self) -> Period {
        Period::new(self.period_id.clone(), self.period_kind)
    }

    /// Checks the record against the schema invariants.
    ///
    /// `index` is only used to identify the record in the returned error.
    pub fn validate(&self, index: usize) -> Result<(), CoreError> {
        let fail = |reason: String| CoreError::DataValidation {
            index,
            user_id: self.user_id.clone(),
            period_id: self.period_id.clone(),
            reason,
        };

        if self.user_id.trim().is_empty() {
            return Err(fail("user_id must not be empty".to_string()));
        }
        if self.period_id.trim().is_empty() {
            return Err(fail("period_id must not be empty".to_string()));
        }

        for (field, value) in [
            ("meetings_per_day", self.meetings_per_day),
            ("meeting_minutes_per_day", self.meeting_minutes_per_day),
        ] {
            if !value.is_finite() {
                return Err(fail(format!("{field} is not a number ({value})")));
            }
            if value < 0.0 {
                return Err(fail(format!("{field} must be non-negative, got {value}")));
            }
        }

        if self.total_meetings < self.one_on_one_calls {
            return Err(fail(format!(
                "total_meetings ({}) is smaller than one_on_one_calls ({})",
                self.total_meetings, self.one_on_one_calls
            )));
        }

        let typed_sum = u64::from(self.instant_meetings)
            + u64::from(self.scheduled_meetings)
            + u64::from(self.one_on_one_calls);
        if typed_sum != u64::from(self.total_meetings) {
            return Err(fail(format!(
                "total_meetings ({}) does not equal instant + scheduled + 1v1 ({typed_sum})",
                self.total_meetings
            )));
        }

        Ok(())
    }
}

/// A reporting period, ordered the way the analysis walks through time.
///
/// Monthly periods come before weekly ones. Within a kind the month (and the
/// start day for weeks) parsed from the id decides; ids that cannot be parsed
/// sort last, by their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub id: String,
    pub kind: PeriodKind,
}

impl Period {
    pub fn new(id: impl Into<String>, kind: PeriodKind) -> Self {
        Self { id: id.into(), kind }
    }

    /// Parses `(month, day)` from the start of the id. "9月" gives `(9, 0)`,
    /// "10.20-10.26" gives `(10, 20)`.
    pub fn start(&self) -> Option<(u32, u32)> {
        let id = self.id.trim();
        let month_digits: String = id.chars().take_while(|c| c.is_ascii_digit()).collect();
        let month: u32 = month_digits.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        let rest = &id[month_digits.len()..];
        let day = match rest.strip_prefix('.') {
            Some(tail) => {
                let day_digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
                day_digits.parse().ok()?
            }
            None => 0,
        };

        Some((month, day))
    }

    fn sort_key(&self) -> (u8, bool, (u32, u32), &str) {
        let start = self.start();
        (self.kind.rank(), start.is_none(), start.unwrap_or_default(), self.id.as_str())
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
