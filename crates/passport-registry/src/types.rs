//! Passport record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a passport record. Allocated 1, 2, 3, ... and never reused.
pub type RecordId = u64;

/// One registry entry for a physical product's passport.
///
/// The `locator` points at off-registry content (e.g. an IPFS CID) and
/// `integrity_hash` is a digest of that content; both are opaque to the
/// registry and compared only as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassportRecord {
    /// Registry-assigned identifier
    pub id: RecordId,

    /// Content locator for the off-registry passport document
    pub locator: String,

    /// Digest of the passport document content
    pub integrity_hash: String,

    /// Caller-supplied external product key
    pub product_id: String,

    /// Principal that registered this passport
    pub issuer: String,

    /// Opaque supplier description, no uniqueness constraint
    pub supplier_info: String,

    /// When the passport was registered
    pub created_at: DateTime<Utc>,

    /// False once deactivated; the transition is one-way
    pub active: bool,
}

impl PassportRecord {
    /// Create a new active record.
    pub fn new(
        id: RecordId,
        locator: impl Into<String>,
        integrity_hash: impl Into<String>,
        product_id: impl Into<String>,
        issuer: impl Into<String>,
        supplier_info: impl Into<String>,
    ) -> Self {
        Self {
            id,
            locator: locator.into(),
            integrity_hash: integrity_hash.into(),
            product_id: product_id.into(),
            issuer: issuer.into(),
            supplier_info: supplier_info.into(),
            created_at: Utc::now(),
            active: true,
        }
    }

    /// Replace the content locator and integrity hash.
    pub fn replace_content(&mut self, locator: impl Into<String>, integrity_hash: impl Into<String>) {
        self.locator = locator.into();
        self.integrity_hash = integrity_hash.into();
    }

    /// Mark the record as deactivated.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Result of verifying an integrity hash.
///
/// `valid` is true only when the hash maps to an active record. For a
/// deactivated record the id and locator are still surfaced so a verifier
/// can see what the hash used to belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashVerification {
    /// Whether the hash belongs to an active passport
    pub valid: bool,

    /// Record id the hash maps to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Content locator of the mapped record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

impl HashVerification {
    /// Verification for a hash the registry has never seen.
    pub fn unknown() -> Self {
        Self {
            valid: false,
            id: None,
            locator: None,
        }
    }
}

/// Result of verifying a content locator. Symmetric to [`HashVerification`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocatorVerification {
    /// Whether the locator belongs to an active passport
    pub valid: bool,

    /// Record id the locator maps to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Integrity hash of the mapped record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity_hash: Option<String>,
}

impl LocatorVerification {
    /// Verification for a locator the registry has never seen.
    pub fn unknown() -> Self {
        Self {
            valid: false,
            id: None,
            integrity_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_active() {
        let record = PassportRecord::new(1, "cid1", "h1", "P1", "issuer-a", "sup");
        assert!(record.active);
        assert_eq!(record.id, 1);
        assert_eq!(record.issuer, "issuer-a");
    }

    #[test]
    fn test_replace_content() {
        let mut record = PassportRecord::new(1, "cid1", "h1", "P1", "issuer-a", "sup");
        record.replace_content("cid2", "h2");

        assert_eq!(record.locator, "cid2");
        assert_eq!(record.integrity_hash, "h2");
        // Immutable fields untouched
        assert_eq!(record.product_id, "P1");
        assert_eq!(record.issuer, "issuer-a");
    }

    #[test]
    fn test_deactivate() {
        let mut record = PassportRecord::new(1, "cid1", "h1", "P1", "issuer-a", "sup");
        record.deactivate();
        assert!(!record.active);
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let record = PassportRecord::new(7, "cid7", "h7", "P7", "issuer-a", "sup");
        let json = serde_json::to_string(&record).unwrap();
        let restored: PassportRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_verification_unknown_omits_fields() {
        let json = serde_json::to_string(&HashVerification::unknown()).unwrap();
        assert_eq!(json, r#"{"valid":false}"#);

        let json = serde_json::to_string(&LocatorVerification::unknown()).unwrap();
        assert_eq!(json, r#"{"valid":false}"#);
    }
}
