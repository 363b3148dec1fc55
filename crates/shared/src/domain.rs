use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CategoryId);
id_newtype!(HouseholdId);

pub const ACTIVE_STATUS_LABEL: &str = "Actif";
pub const INACTIVE_STATUS_LABEL: &str = "Inactif";

/// Reference to the household owning a category. Households are managed
/// elsewhere; only the shape is known here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdRef {
    pub id: HouseholdId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    pub is_active: bool,
    #[serde(default)]
    pub household: Option<HouseholdRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Category {
    /// Status text shown in the table. Falls back to a label derived from
    /// `is_active` when the backend sent none.
    pub fn status_label(&self) -> &str {
        if !self.status.trim().is_empty() {
            &self.status
        } else if self.is_active {
            ACTIVE_STATUS_LABEL
        } else {
            INACTIVE_STATUS_LABEL
        }
    }

    pub fn household_name(&self) -> Option<&str> {
        self.household.as_ref().map(|household| household.name.as_str())
    }
}

/// User identifiers arrive either as JSON numbers or strings depending on the
/// backend; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawUserId {
            Number(i64),
            Text(String),
        }

        Ok(match RawUserId::deserialize(deserializer)? {
            RawUserId::Number(value) => UserId(value.to_string()),
            RawUserId::Text(value) => UserId(value),
        })
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Profile fields this client does not interpret but must round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
