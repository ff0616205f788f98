use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::services::store::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingType {
    #[default]
    Onboarding,
    Kickoff,
    Review,
    Planning,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: Option<String>,
    pub title: String,
    pub project_id: String,
    pub company_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub meeting_date: DateTime<Utc>,
    /// Wall-clock start, e.g. `14:30`.
    pub meeting_time: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub location: Option<String>,
    pub meeting_type: MeetingType,
    pub status: MeetingStatus,
    pub notes: Option<String>,
    pub created_by: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Meeting {
    const COLLECTION: &'static str = "meetings";

    fn id(&self) -> &str {
        &self.id
    }
}
