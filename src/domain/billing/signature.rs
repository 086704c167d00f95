//! Processor callback signature verification.
//!
//! The processor signs a callback by concatenating a fixed list of scalar
//! fields from `obj` (no delimiter), computing HMAC-SHA512 over the result
//! with the shared secret, and sending the lower-case hex digest as `hmac`.
//!
//! The rendering of each value is a contract with the processor:
//! - integers: decimal, no quoting, no grouping (`20000`)
//! - strings: verbatim
//! - booleans: `true` / `false`
//!
//! Verification is all-or-nothing. A missing field, a field of the wrong JSON
//! type (including `null`), a non-hex signature or a digest mismatch is
//! invalid.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// JSON type a canonical field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Flag,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Text => "string",
            FieldKind::Flag => "boolean",
        }
    }
}

/// Fields covered by the signature, in signing order.
pub const CANONICAL_FIELDS: [(&str, FieldKind); 20] = [
    ("amount_cents", FieldKind::Integer),
    ("created_at", FieldKind::Text),
    ("currency", FieldKind::Text),
    ("error_occured", FieldKind::Flag),
    ("has_parent_transaction", FieldKind::Flag),
    ("id", FieldKind::Integer),
    ("integration_id", FieldKind::Integer),
    ("is_3d_secure", FieldKind::Flag),
    ("is_auth", FieldKind::Flag),
    ("is_capture", FieldKind::Flag),
    ("is_refunded", FieldKind::Flag),
    ("is_standalone_payment", FieldKind::Flag),
    ("is_voided", FieldKind::Flag),
    ("order_id", FieldKind::Integer),
    ("owner", FieldKind::Integer),
    ("pending", FieldKind::Flag),
    ("source_data_pan", FieldKind::Text),
    ("source_data_sub_type", FieldKind::Text),
    ("source_data_type", FieldKind::Text),
    ("success", FieldKind::Flag),
];

/// Why a signature was judged invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signed field '{0}' is missing")]
    MissingField(&'static str),

    #[error("signed field '{field}' must be a {expected}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("signature is not a hex digest")]
    MalformedSignature,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Builds the string the processor signs.
pub fn canonical_string(obj: &Map<String, Value>) -> Result<String, SignatureError> {
    let mut out = String::with_capacity(256);
    for (field, kind) in CANONICAL_FIELDS {
        let value = obj.get(field).ok_or(SignatureError::MissingField(field))?;
        let unexpected = || SignatureError::UnexpectedType {
            field,
            expected: kind.name(),
        };
        match (kind, value) {
            (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                out.push_str(&n.to_string())
            }
            (FieldKind::Text, Value::String(s)) => out.push_str(s),
            (FieldKind::Flag, Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
            _ => return Err(unexpected()),
        }
    }
    Ok(out)
}

/// Verifier for processor callback signatures.
pub struct SignatureVerifier {
    secret: SecretString,
}

impl SignatureVerifier {
    /// Creates a new verifier with the shared HMAC secret.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Computes the lower-case hex digest the processor would send for `obj`.
    pub fn sign(&self, obj: &Map<String, Value>) -> Result<String, SignatureError> {
        let canonical = canonical_string(obj)?;
        Ok(hex::encode(self.digest(canonical.as_bytes())))
    }

    /// Checks `supplied` against the digest of `obj`.
    ///
    /// Hex case is ignored; the byte comparison is constant-time.
    pub fn verify(&self, obj: &Map<String, Value>, supplied: &str) -> Result<(), SignatureError> {
        let canonical = canonical_string(obj)?;
        let supplied = hex::decode(supplied.trim()).map_err(|_| SignatureError::MalformedSignature)?;
        let expected = self.digest(canonical.as_bytes());

        if expected.len() != supplied.len() || !bool::from(expected.ct_eq(&supplied)) {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }

    fn digest(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha512::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Map, Value};

    pub const SECRET: &str = "test_hmac_secret";

    /// Canonical string of [`transaction_obj`].
    pub const CANONICAL: &str = "200002023-11-14T22:13:20.000000EGPfalsefalse1920364654097558truefalsefalsefalsetruefalse2175037541745530false2346MasterCardcardtrue";

    /// HMAC-SHA512(SECRET, CANONICAL), computed independently of this crate.
    pub const DIGEST: &str = "1d6bafedee19b1a797c784293b9a95d599e8552acf8d21d5f8b4679f1f1c7629016febd41be4afbbf91e68bdd46da6959f8a486155934200cf0e9b8106041e80";

    pub fn transaction_obj() -> Map<String, Value> {
        let value = json!({
            "amount_cents": 20000,
            "created_at": "2023-11-14T22:13:20.000000",
            "currency": "EGP",
            "error_occured": false,
            "has_parent_transaction": false,
            "id": 192036465,
            "integration_id": 4097558,
            "is_3d_secure": true,
            "is_auth": false,
            "is_capture": false,
            "is_refunded": false,
            "is_standalone_payment": true,
            "is_voided": false,
            "order_id": 217503754,
            "owner": 1745530,
            "pending": false,
            "source_data_pan": "2346",
            "source_data_sub_type": "MasterCard",
            "source_data_type": "card",
            "success": true,
            "order": {
                "id": 217503754,
                "merchant_order_id": "64f1a2b3c4d5e6f7g8h9i0j1---SUBSCRIPTION---professional---1700000000000"
            }
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }
}
