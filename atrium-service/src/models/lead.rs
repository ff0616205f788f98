use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::services::store::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

/// A CRM prospect, scoped to an organization and assigned to one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: Option<String>,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub source: Option<String>,
    pub assigned_to: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub converted_to_customer: bool,
    pub created_by: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Record for Lead {
    const COLLECTION: &'static str = "leads";

    fn id(&self) -> &str {
        &self.id
    }
}
