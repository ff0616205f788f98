use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Meeting, MeetingStatus, MeetingType};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMeetingRequest {
    #[validate(length(min = 1, max = 200, message = "Meeting title is required"))]
    #[schema(example = "Kickoff with Acme")]
    pub title: String,

    #[validate(length(min = 1, message = "Project is required"))]
    pub project_id: String,

    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,

    pub meeting_date: DateTime<Utc>,

    #[validate(length(min = 1, message = "Meeting time is required"))]
    #[schema(example = "14:30")]
    pub meeting_time: String,

    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: Option<i32>,

    #[serde(default)]
    pub attendees: Vec<String>,

    pub location: Option<String>,

    #[schema(value_type = Option<String>, example = "kickoff")]
    pub meeting_type: Option<MeetingType>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMeetingRequest {
    #[validate(length(min = 1, max = 200, message = "Meeting title cannot be empty"))]
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub meeting_date: Option<DateTime<Utc>>,
    pub meeting_time: Option<String>,
    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: Option<i32>,
    pub attendees: Option<Vec<String>>,
    pub location: Option<String>,
    #[schema(value_type = Option<String>, example = "review")]
    pub meeting_type: Option<MeetingType>,
    #[schema(value_type = Option<String>, example = "completed")]
    pub status: Option<MeetingStatus>,
    pub notes: Option<String>,
}

impl UpdateMeetingRequest {
    pub fn apply(self, meeting: &mut Meeting) {
        if let Some(title) = self.title {
            meeting.title = title;
        }
        if let Some(company) = self.company_name {
            meeting.company_name = company;
        }
        if let Some(date) = self.meeting_date {
            meeting.meeting_date = date;
        }
        if let Some(time) = self.meeting_time {
            meeting.meeting_time = time;
        }
        if let Some(duration) = self.duration_minutes {
            meeting.duration_minutes = duration;
        }
        if let Some(attendees) = self.attendees {
            meeting.attendees = attendees;
        }
        if self.location.is_some() {
            meeting.location = self.location;
        }
        if let Some(kind) = self.meeting_type {
            meeting.meeting_type = kind;
        }
        if let Some(status) = self.status {
            meeting.status = status;
        }
        if self.notes.is_some() {
            meeting.notes = self.notes;
        }
        meeting.updated_at = Utc::now();
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeetingResponse {
    pub id: String,
    pub organization_id: Option<String>,
    pub title: String,
    pub project_id: String,
    pub company_name: String,
    pub meeting_date: DateTime<Utc>,
    pub meeting_time: String,
    pub duration_minutes: i32,
    pub attendees: Vec<String>,
    pub location: Option<String>,
    #[schema(value_type = String, example = "onboarding")]
    pub meeting_type: MeetingType,
    #[schema(value_type = String, example = "scheduled")]
    pub status: MeetingStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Meeting> for MeetingResponse {
    fn from(m: Meeting) -> Self {
        Self {
            id: m.id,
            organization_id: m.organization_id,
            title: m.title,
            project_id: m.project_id,
            company_name: m.company_name,
            meeting_date: m.meeting_date,
            meeting_time: m.meeting_time,
            duration_minutes: m.duration_minutes,
            attendees: m.attendees,
            location: m.location,
            meeting_type: m.meeting_type,
            status: m.status,
            notes: m.notes,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
