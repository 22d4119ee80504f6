use serde::{Deserialize, Serialize};

/// A time-bounded exclusive right to submit intents for an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lease {
    pub lease_id: String,
    pub entity_id: String,
    pub controller_id: String,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
}

impl Lease {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaseDenied {
    AlreadyLeased,
    Expired,
    UnknownLease,
    UnknownEntity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquireLeaseRequest {
    pub entity_id: String,
    pub controller_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenewLeaseRequest {
    pub lease_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseLeaseRequest {
    pub lease_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaseResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<LeaseDenied>,
}

impl LeaseResponse {
    pub fn granted(lease: &Lease) -> Self {
        Self {
            success: true,
            lease_id: Some(lease.lease_id.clone()),
            expires_at_ms: Some(lease.expires_at_ms),
            reason: None,
        }
    }

    pub fn denied(reason: LeaseDenied) -> Self {
        Self {
            success: false,
            lease_id: None,
            expires_at_ms: None,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseLeaseResponse {
    pub success: bool,
}
