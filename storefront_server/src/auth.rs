//! Back-office access control.
//!
//! Callers identify themselves with an API key in the `X-Api-Key` header. Each configured key carries a [`Role`], and
//! each role resolves to a fixed set of [`Capabilities`]. Routes declare the capabilities they require (see the
//! `route!` macro), and the ACL middleware checks the caller's set against them.
use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sf_common::Secret;
use thiserror::Error;

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "customer" => Ok(Role::Customer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Customer => "customer",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Move orders through the fulfilment flow.
    ManageOrders,
    /// Read every setting and change them.
    ManageSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn contains_all(&self, required: &[Capability]) -> bool {
        required.iter().all(|c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The capabilities granted to a role.
pub fn capabilities_for(role: Role) -> Capabilities {
    match role {
        Role::Admin => [Capability::ManageOrders, Capability::ManageSettings].into_iter().collect(),
        Role::Staff => [Capability::ManageOrders].into_iter().collect(),
        Role::Customer => Capabilities::default(),
    }
}

#[derive(Debug, Clone, Error)]
pub enum AccessKeyError {
    #[error("Access key entries must look like key:role, but got '{0}'")]
    MalformedEntry(String),
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
}

/// The configured API keys and the role each one grants.
#[derive(Debug, Clone, Default)]
pub struct AccessKeys {
    keys: Vec<(Secret<String>, Role)>,
}

impl AccessKeys {
    pub fn new(keys: Vec<(Secret<String>, Role)>) -> Self {
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn role_for(&self, api_key: &str) -> Option<Role> {
        if api_key.is_empty() {
            return None;
        }
        self.keys.iter().find(|(k, _)| k.reveal() == api_key).map(|(_, role)| *role)
    }

    pub fn capabilities_for_key(&self, api_key: &str) -> Capabilities {
        self.role_for(api_key).map(capabilities_for).unwrap_or_default()
    }
}

impl FromStr for AccessKeys {
    type Err = AccessKeyError;

    /// Parses `key:role` pairs separated by commas, e.g. `k3y-0ne:admin,k3y-tw0:staff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keys = s
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|entry| {
                let (key, role) = entry.rsplit_once(':').ok_or_else(|| AccessKeyError::MalformedEntry(entry.into()))?;
                if key.is_empty() {
                    return Err(AccessKeyError::MalformedEntry(entry.into()));
                }
                Ok((Secret::new(key.to_string()), role.parse::<Role>()?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }
}
