use core_types::{Period, Record};
use serde::Deserialize;

/// One row of an exported meeting report, keyed by the export's column names.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRow {
    pub user_name: String,
    #[serde(rename = "日人均线上会议数")]
    pub meetings_per_day: f64,
    #[serde(rename = "日人均线上会议时长(分钟)")]
    pub meeting_minutes_per_day: f64,
    #[serde(rename = "即时会议")]
    pub instant_meetings: u32,
    #[serde(rename = "日程会议")]
    pub scheduled_meetings: u32,
    #[serde(rename = "1v1通话数")]
    pub one_on_one_calls: u32,
    #[serde(rename = "人的会议数")]
    pub total_meetings: u32,
}

impl ReportRow {
    pub fn into_record(self, period: &Period) -> Record {
        Record {
            user_id: self.user_name,
            period_id: period.id.clone(),
            period_kind: period.kind,
            meetings_per_day: self.meetings_per_day,
            meeting_minutes_per_day: self.meeting_minutes_per_day,
            instant_meetings: self.instant_meetings,
            scheduled_meetings: self.scheduled_meetings,
            one_on_one_calls: self.one_on_one_calls,
            total_meetings: self.total_meetings,
        }
    }
}
