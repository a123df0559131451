//! Sales rep roster. Users are configured at store construction and never
//! created or mutated by store operations.

use super::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "vendedor")]
    Seller,
    #[serde(rename = "manager")]
    Manager,
}

/// Sales quota per period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    #[serde(rename = "mensal")]
    pub monthly: f64,
    #[serde(rename = "trimestral")]
    pub quarterly: f64,
    #[serde(rename = "anual")]
    pub annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "meta")]
    pub quota: Quota,
}
