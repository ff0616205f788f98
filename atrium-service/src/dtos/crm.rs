use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Lead, LeadStatus};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Grace Hopper")]
    pub name: String,

    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    pub phone: Option<String>,

    #[schema(value_type = Option<String>, example = "new")]
    pub status: Option<LeadStatus>,

    pub source: Option<String>,

    /// Defaults to the caller.
    pub assigned_to: Option<String>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLeadRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Company cannot be empty"))]
    pub company: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Option<String>, example = "qualified")]
    pub status: Option<LeadStatus>,
    pub source: Option<String>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub converted_to_customer: Option<bool>,
}

impl UpdateLeadRequest {
    pub fn apply(self, lead: &mut Lead) {
        if let Some(name) = self.name {
            lead.name = name;
        }
        if let Some(company) = self.company {
            lead.company = company;
        }
        if let Some(email) = self.email {
            lead.email = email.to_lowercase();
        }
        if self.phone.is_some() {
            lead.phone = self.phone;
        }
        if let Some(status) = self.status {
            lead.status = status;
        }
        if self.source.is_some() {
            lead.source = self.source;
        }
        if let Some(assigned_to) = self.assigned_to {
            lead.assigned_to = assigned_to;
        }
        if self.notes.is_some() {
            lead.notes = self.notes;
        }
        if let Some(converted) = self.converted_to_customer {
            lead.converted_to_customer = converted;
        }
        lead.updated_at = Utc::now();
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadResponse {
    pub id: String,
    pub organization_id: Option<String>,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    #[schema(value_type = String, example = "contacted")]
    pub status: LeadStatus,
    pub source: Option<String>,
    pub assigned_to: String,
    pub notes: Option<String>,
    pub converted_to_customer: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            organization_id: lead.organization_id,
            name: lead.name,
            company: lead.company,
            email: lead.email,
            phone: lead.phone,
            status: lead.status,
            source: lead.source,
            assigned_to: lead.assigned_to,
            notes: lead.notes,
            converted_to_customer: lead.converted_to_customer,
            created_by: lead.created_by,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}
