use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marketplace role carried in every identity claim.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Wholesaler,
    Retailer,
    Manufacturer,
    Admin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 4] = [Role::Wholesaler, Role::Retailer, Role::Manufacturer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Wholesaler => "wholesaler",
            Role::Retailer => "retailer",
            Role::Manufacturer => "manufacturer",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
