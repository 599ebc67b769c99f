//! Accounts and their roles.

mod service;

pub use service::{AccountService, RegisterAccount};

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::RecordId;
use record_store::{Collection, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::DomainError;
use crate::value_objects::AccountId;

/// The part an account plays on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Lists products and accepts orders.
    Supplier,

    /// Places orders.
    #[serde(alias = "retailer")]
    Merchant,

    /// Claims ready orders and delivers them.
    #[serde(alias = "shipping")]
    ShippingCompany,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supplier => "supplier",
            Role::Merchant => "merchant",
            Role::ShippingCompany => "shipping_company",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "supplier" => Ok(Role::Supplier),
            "merchant" | "retailer" => Ok(Role::Merchant),
            "shipping_company" | "shipping" => Ok(Role::ShippingCompany),
            other => Err(DomainError::InvalidArgument(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

/// A registered platform account. Never mutated by the fulfillment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub role: Role,
    /// Display name of the person behind the account.
    pub name: String,
    pub company_name: Option<String>,
    /// Lower-cased, unique across accounts.
    pub email: String,
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,

    #[serde(skip)]
    version: Version,
}

impl Account {
    /// Returns true if `email` matches this account's address, ignoring case
    /// and surrounding whitespace.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

impl Document for Account {
    const COLLECTION: Collection = Collection::Accounts;
    const ENTITY: &'static str = "Account";

    fn record_id(&self) -> RecordId {
        self.id.record_id()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_fields() -> &'static [&'static str] {
        &["email"]
    }
}
