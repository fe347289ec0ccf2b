//! The in-memory registry state machine.
//!
//! `Registry` owns the entry table, the three uniqueness indices and the
//! issuer allow-list, and enforces every structural invariant synchronously.
//! It has no locking and no IO; [`crate::store::RegistryStore`] wraps it in
//! the single-writer critical section and emits notifications.

use crate::error::{DuplicateField, RegistryError};
use crate::types::{HashVerification, LocatorVerification, PassportRecord, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Passport registry state: entry table, uniqueness indices, authorization.
///
/// The table is append-only: records are never deleted, and a locator,
/// integrity hash or product id stays reserved forever once registered,
/// even after its record is deactivated. Identifiers start at 1 and are
/// allocated only by successful registrations, so the k-th successful
/// registration always receives id k.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    /// Distinguished principal with full administrative rights
    owner: String,

    /// Principals allowed to register passports (the owner is implicitly
    /// authorized and never needs to appear here)
    issuers: HashSet<String>,

    /// Passport records keyed by id
    records: BTreeMap<RecordId, PassportRecord>,

    /// Content locator -> record id
    locator_index: HashMap<String, RecordId>,

    /// Integrity hash -> record id
    hash_index: HashMap<String, RecordId>,

    /// Product id -> record id
    product_index: HashMap<String, RecordId>,

    /// Next id to allocate; incremented only on successful registration
    next_id: RecordId,
}

impl Registry {
    /// Create an empty registry owned by `owner`.
    pub fn new(owner: impl Into<String>) -> Result<Self, RegistryError> {
        let owner = owner.into();
        if owner.is_empty() {
            return Err(RegistryError::Validation(
                "owner principal must be non-empty".into(),
            ));
        }
        Ok(Self {
            owner,
            issuers: HashSet::new(),
            records: BTreeMap::new(),
            locator_index: HashMap::new(),
            hash_index: HashMap::new(),
            product_index: HashMap::new(),
            next_id: 1,
        })
    }

    /// The owner principal.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// True iff `principal` is the owner or an authorized issuer.
    pub fn is_authorized(&self, principal: &str) -> bool {
        principal == self.owner || self.issuers.contains(principal)
    }

    /// Principals currently on the issuer allow-list (owner excluded).
    pub fn authorized_issuers(&self) -> impl Iterator<Item = &str> {
        self.issuers.iter().map(|s| s.as_str())
    }

    /// Add `principal` to the issuer allow-list. Owner-only; idempotent.
    pub fn authorize_issuer(&mut self, caller: &str, principal: &str) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::Unauthorized(caller.into()));
        }
        if principal.is_empty() {
            return Err(RegistryError::Validation(
                "issuer principal must be non-empty".into(),
            ));
        }
        self.issuers.insert(principal.into());
        Ok(())
    }

    /// Remove `principal` from the issuer allow-list. Owner-only; idempotent.
    /// The owner itself can never be revoked.
    pub fn revoke_issuer(&mut self, caller: &str, principal: &str) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::Unauthorized(caller.into()));
        }
        if principal == self.owner {
            return Err(RegistryError::Validation(
                "the owner cannot be revoked".into(),
            ));
        }
        self.issuers.remove(principal);
        Ok(())
    }

    /// Register a new passport and return its id.
    ///
    /// Preconditions are checked in order, first failure wins, and a failed
    /// call has no effect: no index writes and no id consumed.
    pub fn register(
        &mut self,
        caller: &str,
        locator: &str,
        integrity_hash: &str,
        product_id: &str,
        supplier_info: &str,
    ) -> Result<RecordId, RegistryError> {
        if !self.is_authorized(caller) {
            return Err(RegistryError::Unauthorized(caller.into()));
        }
        if locator.is_empty() || integrity_hash.is_empty() || product_id.is_empty() {
            return Err(RegistryError::Validation(
                "locator, integrity hash and product id must be non-empty".into(),
            ));
        }
        if self.locator_index.contains_key(locator) {
            return Err(RegistryError::Duplicate {
                field: DuplicateField::Locator,
                value: locator.into(),
            });
        }
        if self.hash_index.contains_key(integrity_hash) {
            return Err(RegistryError::Duplicate {
                field: DuplicateField::Hash,
                value: integrity_hash.into(),
            });
        }
        if self.product_index.contains_key(product_id) {
            return Err(RegistryError::Duplicate {
                field: DuplicateField::ProductId,
                value: product_id.into(),
            });
        }

        let id = self.next_id;
        let record =
            PassportRecord::new(id, locator, integrity_hash, product_id, caller, supplier_info);
        self.locator_index.insert(locator.into(), id);
        self.hash_index.insert(integrity_hash.into(), id);
        self.product_index.insert(product_id.into(), id);
        self.records.insert(id, record);
        self.next_id += 1;
        Ok(id)
    }

    /// Replace a passport's content locator and integrity hash.
    ///
    /// Only the record's issuer or the owner may update. Each new key must
    /// be unused or already mapped to this same record; product id and
    /// issuer are immutable.
    pub fn update(
        &mut self,
        caller: &str,
        id: RecordId,
        locator: &str,
        integrity_hash: &str,
    ) -> Result<(), RegistryError> {
        let record = self
            .records
            .get(&id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if !record.active {
            return Err(RegistryError::Inactive(id));
        }
        if caller != record.issuer && caller != self.owner {
            return Err(RegistryError::Unauthorized(caller.into()));
        }
        if locator.is_empty() || integrity_hash.is_empty() {
            return Err(RegistryError::Validation(
                "locator and integrity hash must be non-empty".into(),
            ));
        }
        if let Some(&holder) = self.locator_index.get(locator) {
            if holder != id {
                return Err(RegistryError::Duplicate {
                    field: DuplicateField::Locator,
                    value: locator.into(),
                });
            }
        }
        if let Some(&holder) = self.hash_index.get(integrity_hash) {
            if holder != id {
                return Err(RegistryError::Duplicate {
                    field: DuplicateField::Hash,
                    value: integrity_hash.into(),
                });
            }
        }

        let old_locator = record.locator.clone();
        let old_hash = record.integrity_hash.clone();

        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        record.replace_content(locator, integrity_hash);
        self.locator_index.remove(&old_locator);
        self.hash_index.remove(&old_hash);
        self.locator_index.insert(locator.into(), id);
        self.hash_index.insert(integrity_hash.into(), id);
        Ok(())
    }

    /// Deactivate a passport. Terminal: a second deactivation is an error,
    /// and the record's keys remain reserved in all three indices.
    pub fn deactivate(&mut self, caller: &str, id: RecordId) -> Result<(), RegistryError> {
        let record = self
            .records
            .get(&id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if !record.active {
            return Err(RegistryError::Inactive(id));
        }
        if caller != record.issuer && caller != self.owner {
            return Err(RegistryError::Unauthorized(caller.into()));
        }

        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        record.deactivate();
        Ok(())
    }

    /// Get a passport record by id.
    pub fn get(&self, id: RecordId) -> Result<&PassportRecord, RegistryError> {
        self.records
            .get(&id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Get a passport record by product id.
    pub fn get_by_product_id(&self, product_id: &str) -> Result<&PassportRecord, RegistryError> {
        let id = self
            .product_index
            .get(product_id)
            .ok_or_else(|| RegistryError::NotFound(product_id.into()))?;
        self.get(*id)
    }

    /// Total passports ever registered, active and deactivated alike.
    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Verify an integrity hash. Never fails; an unmapped hash yields an
    /// all-empty invalid result.
    pub fn verify_by_hash(&self, integrity_hash: &str) -> HashVerification {
        match self
            .hash_index
            .get(integrity_hash)
            .and_then(|id| self.records.get(id))
        {
            Some(record) => HashVerification {
                valid: record.active,
                id: Some(record.id),
                locator: Some(record.locator.clone()),
            },
            None => HashVerification::unknown(),
        }
    }

    /// Verify a content locator. Symmetric to [`Registry::verify_by_hash`].
    pub fn verify_by_locator(&self, locator: &str) -> LocatorVerification {
        match self
            .locator_index
            .get(locator)
            .and_then(|id| self.records.get(id))
        {
            Some(record) => LocatorVerification {
                valid: record.active,
                id: Some(record.id),
                integrity_hash: Some(record.integrity_hash.clone()),
            },
            None => LocatorVerification::unknown(),
        }
    }

    /// Sweep the structural invariants: every record's keys map back to its
    /// id, no index key points at a missing record, ids are contiguous from
    /// 1, and the allocator sits one past the highest id.
    ///
    /// Used when accepting a persisted snapshot; any violation means the
    /// durable form was tampered with or half-written.
    pub fn check_consistency(&self) -> Result<(), RegistryError> {
        if self.owner.is_empty() {
            return Err(RegistryError::Corrupt("empty owner principal".into()));
        }
        if self.next_id != self.records.len() as u64 + 1 {
            return Err(RegistryError::Corrupt(format!(
                "allocator at {} but {} records",
                self.next_id,
                self.records.len()
            )));
        }
        for (expected, (&id, record)) in (1u64..).zip(self.records.iter()) {
            if id != expected || record.id != id {
                return Err(RegistryError::Corrupt(format!(
                    "non-contiguous or mismatched record id {}",
                    id
                )));
            }
            if self.locator_index.get(&record.locator) != Some(&id) {
                return Err(RegistryError::Corrupt(format!(
                    "locator index disagrees for record {}",
                    id
                )));
            }
            if self.hash_index.get(&record.integrity_hash) != Some(&id) {
                return Err(RegistryError::Corrupt(format!(
                    "hash index disagrees for record {}",
                    id
                )));
            }
            if self.product_index.get(&record.product_id) != Some(&id) {
                return Err(RegistryError::Corrupt(format!(
                    "product index disagrees for record {}",
                    id
                )));
            }
        }
        for (index, name) in [
            (&self.locator_index, "locator"),
            (&self.hash_index, "hash"),
            (&self.product_index, "product"),
        ] {
            if index.len() != self.records.len() {
                return Err(RegistryError::Corrupt(format!(
                    "{} index has {} keys for {} records",
                    name,
                    index.len(),
                    self.records.len()
                )));
            }
            for id in index.values() {
                if !self.records.contains_key(id) {
                    return Err(RegistryError::Corrupt(format!(
                        "{} index points at missing record {}",
                        name, id
                    )));
                }
            }
        }
        Ok(())
    }
}
