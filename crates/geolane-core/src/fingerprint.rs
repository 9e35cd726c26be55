//! Deterministic query fingerprints used as cache keys.
//!
//! Parameters are sorted by name before hashing, so two queries built from
//! the same pairs in a different order share a fingerprint.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::query::{Query, QueryValue};

/// Hex-encoded SHA-256 digest of a canonicalized [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of a query.
pub fn fingerprint(query: &Query) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(canonical_form(query).as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

/// Fingerprint of a query within a namespace, e.g. a remote path. The same
/// query under different scopes yields different fingerprints.
pub fn fingerprint_scoped(scope: &str, query: &Query) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical_form(query).as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

/// JSON object of the parameters in name order. Each value is a
/// `[kind, value]` pair; floats are written as text so NaN and the
/// infinities stay distinct.
fn canonical_form(query: &Query) -> String {
    let canonical: serde_json::Map<String, serde_json::Value> = query
        .sorted()
        .into_iter()
        .map(|(k, v)| (k.to_string(), tagged(v)))
        .collect();
    serde_json::Value::Object(canonical).to_string()
}

fn tagged(value: &QueryValue) -> serde_json::Value {
    use serde_json::json;
    match value {
        QueryValue::Bool(b) => json!(["b", b]),
        QueryValue::Int(n) => json!(["i", n]),
        QueryValue::Float(x) => json!(["f", x.to_string()]),
        QueryValue::Str(s) => json!(["s", s]),
    }
}
