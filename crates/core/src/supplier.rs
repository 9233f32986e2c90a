use serde::{Deserialize, Serialize};

/// Server-assigned supplier identifier, stable across polls.
///
/// Opaque at this layer; the backend mints it and the client only keys by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(String);

impl SupplierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SupplierId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Review status lifecycle for a supplier record.
///
/// Serialized capitalized, matching the backend's wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SupplierStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SupplierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierStatus::Pending => "Pending",
            SupplierStatus::Approved => "Approved",
            SupplierStatus::Rejected => "Rejected",
        }
    }
}

impl core::fmt::Display for SupplierStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address as the backend ships it (all parts optional).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// A supplier record mirrored from the backend.
///
/// Descriptive fields are read-only to the client core; only `status` is
/// ever changed locally, and only through the sync engine's optimistic
/// mutation path. Field names follow the backend's JSON (`camelCase`,
/// Mongo-style `_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRecord {
    #[serde(rename = "_id")]
    pub id: SupplierId,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub years_in_business: Option<u32>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub status: SupplierStatus,
}
