use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::services::store::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    pub start_date: Option<mongodb::bson::DateTime>,
    pub end_date: Option<mongodb::bson::DateTime>,
    pub budget: Option<f64>,
    /// Percent complete, 0 to 100.
    pub progress: u8,
    pub manager: String,
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Project {
    const COLLECTION: &'static str = "projects";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A progress note posted against a project. Removed with its project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_id: String,
    pub organization_id: Option<String>,
    pub content: String,
    pub progress: Option<u8>,
    pub created_by: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Record for ProjectUpdate {
    const COLLECTION: &'static str = "project_updates";

    fn id(&self) -> &str {
        &self.id
    }
}
