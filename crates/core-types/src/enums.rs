use crate::structs::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The granularity of the period a record was aggregated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Calendar-month aggregates. These form the baseline cohort.
    Monthly,
    /// Weekly aggregates collected after the intervention.
    Weekly,
}

impl PeriodKind {
    /// Rank used when ordering periods: every monthly period precedes every weekly one.
    pub fn rank(&self) -> u8 {
        match self {
            PeriodKind::Monthly => 0,
            PeriodKind::Weekly => 1,
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKind::Monthly => write!(f, "monthly"),
            PeriodKind::Weekly => write!(f, "weekly"),
        }
    }
}

/// Every quantity the analysis engine knows how to read from a `Record`.
///
/// Replaces lookups by column name: each variant has a fixed accessor, so an
/// unknown metric is a compile error instead of a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MeetingsPerDay,
    MeetingMinutesPerDay,
    InstantMeetings,
    ScheduledMeetings,
    OneOnOneCalls,
    TotalMeetings,
    /// Derived: `meeting_minutes_per_day / meetings_per_day`. Missing when no meetings were held.
    MinutesPerMeeting,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::MeetingsPerDay,
        Metric::MeetingMinutesPerDay,
        Metric::InstantMeetings,
        Metric::ScheduledMeetings,
        Metric::OneOnOneCalls,
        Metric::TotalMeetings,
        Metric::MinutesPerMeeting,
    ];

    /// Reads this metric from a record. `None` means the value is undefined for
    /// that record (only possible for derived metrics).
    pub fn value(&self, record: &Record) -> Option<f64> {
        match self {
            Metric::MeetingsPerDay => Some(record.meetings_per_day),
            Metric::MeetingMinutesPerDay => Some(record.meeting_minutes_per_day),
            Metric::InstantMeetings => Some(f64::from(record.instant_meetings)),
            Metric::ScheduledMeetings => Some(f64::from(record.scheduled_meetings)),
            Metric::OneOnOneCalls => Some(f64::from(record.one_on_one_calls)),
            Metric::TotalMeetings => Some(f64::from(record.total_meetings)),
            Metric::MinutesPerMeeting => {
                if record.meetings_per_day > 0.0 {
                    Some(record.meeting_minutes_per_day / record.meetings_per_day)
                } else {
                    None
                }
            }
        }
    }

    /// The source column in the exported meeting tables, if the metric is read directly.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            Metric::MeetingsPerDay => Some("日人均线上会议数"),
            Metric::MeetingMinutesPerDay => Some("日人均线上会议时长(分钟)"),
            Metric::InstantMeetings => Some("即时会议"),
            Metric::ScheduledMeetings => Some("日程会议"),
            Metric::OneOnOneCalls => Some("1v1通话数"),
            Metric::TotalMeetings => Some("人的会议数"),
            Metric::MinutesPerMeeting => None,
        }
    }

    /// Human-readable label for tables and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MeetingsPerDay => "Meetings per day",
            Metric::MeetingMinutesPerDay => "Meeting minutes per day",
            Metric::InstantMeetings => "Instant meetings",
            Metric::ScheduledMeetings => "Scheduled meetings",
            Metric::OneOnOneCalls => "1v1 calls",
            Metric::TotalMeetings => "Total meetings",
            Metric::MinutesPerMeeting => "Minutes per meeting",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(meetings: f64, minutes: f64) -> Record {
        Record {
            user_id: "alice".to_string(),
            period_id: "9月".to_string(),
            period_kind: PeriodKind::Monthly,
            meetings_per_day: meetings,
            meeting_minutes_per_day: minutes,
            instant_meetings: 3,
            scheduled_meetings: 5,
            one_on_one_calls: 2,
            total_meetings: 10,
        }
    }

    #[test]
    fn derived_minutes_per_meeting_is_missing_without_meetings() {
        assert_eq!(Metric::MinutesPerMeeting.value(&record(0.0, 0.0)), None);
        assert_eq!(Metric::MinutesPerMeeting.value(&record(2.0, 60.0)), Some(30.0));
    }

    #[test]
    fn count_metrics_read_typed_fields() {
        let r = record(2.0, 60.0);
        assert_eq!(Metric::InstantMeetings.value(&r), Some(3.0));
        assert_eq!(Metric::TotalMeetings.value(&r), Some(10.0));
    }

    #[test]
    fn monthly_ranks_before_weekly() {
        assert!(PeriodKind::Monthly.rank() < PeriodKind::Weekly.rank());
    }
}
