use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationModule {
    Crm,
    Projects,
    Hr,
    Inventory,
    Finance,
}

impl OrganizationModule {
    pub const ALL: [OrganizationModule; 5] = [
        OrganizationModule::Crm,
        OrganizationModule::Projects,
        OrganizationModule::Hr,
        OrganizationModule::Inventory,
        OrganizationModule::Finance,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Basic,
    Premium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Omitted rather than null when unset so the sparse unique index skips it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub modules: Vec<OrganizationModule>,
    #[serde(default)]
    pub plan: SubscriptionPlan,
    pub active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// The workspace provisioned for a newly registered account.
    pub fn for_registration(username: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("{}'s Organization", username),
            domain: email
                .split_once('@')
                .map(|(_, domain)| domain.to_lowercase())
                .filter(|d| !d.is_empty()),
            modules: OrganizationModule::ALL.to_vec(),
            plan: SubscriptionPlan::Free,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Organization {
    const COLLECTION: &'static str = "organizations";

    fn id(&self) -> &str {
        &self.id
    }
}
