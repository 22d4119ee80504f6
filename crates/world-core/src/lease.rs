//! Exclusive controller leases with TTL expiry.

use std::collections::BTreeMap;

use contracts::{Lease, LeaseDenied};

/// Issues and tracks entity control leases. All wall-clock instants are
/// passed in by the caller, so the manager itself stays deterministic.
#[derive(Debug, Clone)]
pub struct LeaseManager {
    ttl_ms: u64,
    leases: BTreeMap<String, Lease>,
    by_entity: BTreeMap<String, String>,
    issued: u64,
}

impl LeaseManager {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            leases: BTreeMap::new(),
            by_entity: BTreeMap::new(),
            issued: 0,
        }
    }

    /// Grants a lease when the entity is free, or refreshes the existing
    /// lease when the same controller re-acquires. The lease id is retained
    /// across renewal-on-acquire; callers must still use whatever this
    /// returns.
    pub fn acquire(
        &mut self,
        entity_id: &str,
        controller_id: &str,
        now_ms: u64,
    ) -> Result<Lease, LeaseDenied> {
        if let Some(lease_id) = self.by_entity.get(entity_id).cloned() {
            if let Some(existing) = self.leases.get(&lease_id).cloned() {
                if !existing.is_expired(now_ms) {
                    if existing.controller_id == controller_id {
                        return Ok(self.refresh(existing, now_ms));
                    }
                    return Err(LeaseDenied::AlreadyLeased);
                }
            }
            self.remove(&lease_id);
        }

        self.issued = self.issued.saturating_add(1);
        let lease = Lease {
            lease_id: format!("lease_{:06}", self.issued),
            entity_id: entity_id.to_string(),
            controller_id: controller_id.to_string(),
            issued_at_ms: now_ms,
            expires_at_ms: now_ms + self.ttl_ms,
        };
        self.by_entity
            .insert(entity_id.to_string(), lease.lease_id.clone());
        self.leases.insert(lease.lease_id.clone(), lease.clone());
        Ok(lease)
    }

    /// Extends an active lease to `now + ttl`. Expiry is terminal: a lapsed
    /// lease cannot be renewed, only re-acquired.
    pub fn renew(&mut self, lease_id: &str, now_ms: u64) -> Result<Lease, LeaseDenied> {
        let Some(lease) = self.leases.get(lease_id).cloned() else {
            return Err(LeaseDenied::UnknownLease);
        };
        if lease.is_expired(now_ms) {
            self.remove(lease_id);
            return Err(LeaseDenied::Expired);
        }
        Ok(self.refresh(lease, now_ms))
    }

    pub fn release(&mut self, lease_id: &str) -> bool {
        if !self.leases.contains_key(lease_id) {
            return false;
        }
        self.remove(lease_id);
        true
    }

    pub fn validate(&self, lease_id: &str, entity_id: &str, now_ms: u64) -> bool {
        self.leases
            .get(lease_id)
            .map(|lease| lease.entity_id == entity_id && !lease.is_expired(now_ms))
            .unwrap_or(false)
    }

    pub fn lease_for_entity(&self, entity_id: &str, now_ms: u64) -> Option<&Lease> {
        self.by_entity
            .get(entity_id)
            .and_then(|lease_id| self.leases.get(lease_id))
            .filter(|lease| !lease.is_expired(now_ms))
    }

    /// Reclaims every lapsed lease; called by the scheduler at most once per
    /// tick. Lazy reclamation on acquire covers the rest.
    pub fn sweep_expired(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .leases
            .values()
            .filter(|lease| lease.is_expired(now_ms))
            .map(|lease| lease.lease_id.clone())
            .collect();
        for lease_id in &expired {
            self.remove(lease_id);
        }
        expired.len()
    }

    fn refresh(&mut self, mut lease: Lease, now_ms: u64) -> Lease {
        lease.expires_at_ms = now_ms + self.ttl_ms;
        self.leases.insert(lease.lease_id.clone(), lease.clone());
        lease
    }

    fn remove(&mut self, lease_id: &str) {
        if let Some(lease) = self.leases.remove(lease_id) {
            self.by_entity.remove(&lease.entity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 30_000;

    #[test]
    fn second_controller_is_denied_while_lease_is_active() {
        let mut manager = LeaseManager::new(TTL);
        manager.acquire("e1", "alpha", 1_000).expect("grant");
        assert_eq!(
            manager.acquire("e1", "beta", 2_000),
            Err(LeaseDenied::AlreadyLeased)
        );
    }

    #[test]
    fn same_controller_reacquire_keeps_the_lease_id() {
        let mut manager = LeaseManager::new(TTL);
        let first = manager.acquire("e1", "alpha", 1_000).expect("grant");
        let second = manager.acquire("e1", "alpha", 5_000).expect("renewal");
        assert_eq!(first.lease_id, second.lease_id);
        assert_eq!(second.expires_at_ms, 5_000 + TTL);
    }

    #[test]
    fn expired_lease_is_reclaimable_by_another_controller() {
        let mut manager = LeaseManager::new(TTL);
        let first = manager.acquire("e1", "alpha", 0).expect("grant");
        let second = manager
            .acquire("e1", "beta", first.expires_at_ms)
            .expect("expired lease reclaimed");
        assert_ne!(first.lease_id, second.lease_id);
        assert_eq!(second.controller_id, "beta");
    }

    #[test]
    fn renew_after_expiry_is_terminal() {
        let mut manager = LeaseManager::new(TTL);
        let lease = manager.acquire("e1", "alpha", 0).expect("grant");
        assert_eq!(
            manager.renew(&lease.lease_id, lease.expires_at_ms),
            Err(LeaseDenied::Expired)
        );
        assert_eq!(
            manager.renew(&lease.lease_id, lease.expires_at_ms),
            Err(LeaseDenied::UnknownLease)
        );
    }

    #[test]
    fn validate_checks_entity_binding_and_expiry() {
        let mut manager = LeaseManager::new(TTL);
        let lease = manager.acquire("e1", "alpha", 0).expect("grant");
        assert!(manager.validate(&lease.lease_id, "e1", TTL - 1));
        assert!(!manager.validate(&lease.lease_id, "e2", TTL - 1));
        assert!(!manager.validate(&lease.lease_id, "e1", TTL));
    }

    #[test]
    fn at_most_one_active_lease_per_entity() {
        let mut manager = LeaseManager::new(TTL);
        manager.acquire("e1", "alpha", 0).expect("grant");
        manager.acquire("e1", "alpha", 10).expect("renewal");
        let active = manager.lease_for_entity("e1", 20).expect("active lease");
        assert_eq!(active.controller_id, "alpha");
        assert_eq!(manager.leases.len(), 1);
    }

    #[test]
    fn sweep_reclaims_only_lapsed_leases() {
        let mut manager = LeaseManager::new(TTL);
        manager.acquire("e1", "alpha", 0).expect("grant");
        manager.acquire("e2", "beta", 20_000).expect("grant");
        assert_eq!(manager.sweep_expired(TTL), 1);
        assert!(manager.lease_for_entity("e1", TTL).is_none());
        assert!(manager.lease_for_entity("e2", TTL).is_some());
    }
}
