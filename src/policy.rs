//! The S3 POST policy document.
//!
//! The policy is serialized to JSON, base64 encoded, and that base64 string is what gets signed. S3 rejects the
//! upload unless every exact-match field in the form agrees with a condition here.

use {
    crate::constants::*,
    base64::{engine::general_purpose::STANDARD, Engine},
    chrono::{DateTime, Duration, Utc},
    serde::{
        ser::{SerializeMap, SerializeSeq},
        Serialize, Serializer,
    },
};

/// A single condition in a POST policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyCondition {
    /// The form field must start with the given prefix. Serialized as `["starts-with", "$field", "prefix"]`.
    StartsWith {
        /// Form field name, without the leading `$`.
        field: String,

        /// Required prefix.
        prefix: String,
    },

    /// The form field must equal the given value. Serialized as `{"field": "value"}`.
    Exact {
        /// Form field name.
        field: String,

        /// Required value.
        value: String,
    },
}

impl PolicyCondition {
    fn exact(field: &str, value: impl Into<String>) -> Self {
        Self::Exact {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

impl Serialize for PolicyCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::StartsWith {
                field,
                prefix,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("starts-with")?;
                seq.serialize_element(&format!("${}", field))?;
                seq.serialize_element(prefix)?;
                seq.end()
            }
            Self::Exact {
                field,
                value,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, value)?;
                map.end()
            }
        }
    }
}

/// A POST policy: an expiration and the ordered list of conditions the submitted form must satisfy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostPolicy {
    expiration: String,
    conditions: Vec<PolicyCondition>,
}

impl PostPolicy {
    /// Create the upload policy for an image-butler upload.
    ///
    /// `now` is the single instant every date in the form derives from; `long_date` and `credential` must have been
    /// computed from it as well. Returns `None` if the expiration falls outside the representable range.
    pub(crate) fn for_upload(now: DateTime<Utc>, bucket: &str, long_date: &str, credential: &str) -> Option<Self> {
        let expiration = now.checked_add_signed(Duration::days(UPLOAD_POLICY_DAYS))?;
        let expiration = expiration.format(EXPIRATION_FORMAT).to_string();

        Some(Self {
            expiration,
            conditions: vec![
                PolicyCondition::StartsWith {
                    field: FIELD_KEY.to_string(),
                    prefix: KEY_PREFIX.to_string(),
                },
                PolicyCondition::exact(FIELD_BUCKET, bucket),
                PolicyCondition::exact(FIELD_ACL, ACL_PUBLIC_READ),
                PolicyCondition::exact(FIELD_X_AMZ_ALGORITHM, AWS4_HMAC_SHA256),
                PolicyCondition::exact(FIELD_X_AMZ_DATE, long_date),
                PolicyCondition::exact(FIELD_X_AMZ_CREDENTIAL, credential),
            ],
        })
    }

    /// The expiration timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
    #[inline]
    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    /// The conditions, in the order they are serialized.
    #[inline]
    pub fn conditions(&self) -> &[PolicyCondition] {
        &self.conditions
    }

    /// Serialize the policy to JSON and base64 encode it. This is the value of the `policy` form field and the
    /// string to sign.
    pub fn to_base64(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }
}
