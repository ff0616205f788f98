use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Project, ProjectPriority, ProjectStatus, ProjectUpdate};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Project name is required"))]
    #[schema(example = "Website relaunch")]
    pub name: String,

    pub description: Option<String>,

    #[schema(value_type = Option<String>, example = "planning")]
    pub status: Option<ProjectStatus>,

    #[schema(value_type = Option<String>, example = "high")]
    pub priority: Option<ProjectPriority>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: Option<f64>,

    /// Defaults to the caller.
    pub manager: Option<String>,

    #[serde(default)]
    pub team: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Project name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "active")]
    pub status: Option<ProjectStatus>,
    #[schema(value_type = Option<String>, example = "urgent")]
    pub priority: Option<ProjectPriority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: Option<f64>,
    #[validate(range(max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<u8>,
    pub manager: Option<String>,
    pub team: Option<Vec<String>>,
}

impl UpdateProjectRequest {
    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if self.description.is_some() {
            project.description = self.description;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        if let Some(start) = self.start_date {
            project.start_date = Some(bson::DateTime::from_chrono(start));
        }
        if let Some(end) = self.end_date {
            project.end_date = Some(bson::DateTime::from_chrono(end));
        }
        if self.budget.is_some() {
            project.budget = self.budget;
        }
        if let Some(progress) = self.progress {
            project.progress = progress;
        }
        if let Some(manager) = self.manager {
            project.manager = manager;
        }
        if let Some(team) = self.team {
            project.team = team;
        }
        project.updated_at = Utc::now();
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectUpdateRequest {
    #[validate(length(min = 1, message = "Update content is required"))]
    pub content: String,

    #[validate(range(max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub organization_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "active")]
    pub status: ProjectStatus,
    #[schema(value_type = String, example = "medium")]
    pub priority: ProjectPriority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub progress: u8,
    pub manager: String,
    pub team: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            organization_id: project.organization_id,
            name: project.name,
            description: project.description,
            status: project.status,
            priority: project.priority,
            start_date: project.start_date.map(|d| d.to_chrono()),
            end_date: project.end_date.map(|d| d.to_chrono()),
            budget: project.budget,
            progress: project.progress,
            manager: project.manager,
            team: project.team,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectUpdateResponse {
    pub id: String,
    pub project_id: String,
    pub content: String,
    pub progress: Option<u8>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectUpdate> for ProjectUpdateResponse {
    fn from(update: ProjectUpdate) -> Self {
        Self {
            id: update.id,
            project_id: update.project_id,
            content: update.content,
            progress: update.progress,
            created_by: update.created_by,
            created_at: update.created_at,
        }
    }
}
