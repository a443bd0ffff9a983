//! The authenticated processing configuration carried inside an upload key.
//!
//! The configuration is serialized through [`ProcessingConfig`] on both the signing and the verifying side, so the
//! signed bytes are fixed by the struct's field order rather than by map iteration order:
//! `version, timestamp, styles, callbackData, callbackUrl, cropOriginal, rotateOriginal`, then `signature`.
//! Absent optional fields are omitted. `styles` and `callbackData` serialize with sorted keys.

use {
    crate::{
        constants::*,
        crypto::{hmac_sha256_hex, signatures_match},
        KeyVerificationError,
    },
    base64::{
        alphabet,
        engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
        Engine,
    },
    log::{debug, trace},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Number, Value},
    std::collections::BTreeMap,
};

/// Base64 engine for the configuration segment of the key.
///
/// The URL-safe alphabet keeps `/` out of the segment, so the key still splits into exactly the expected path
/// segments. Decoding accepts the segment with or without padding.
const KEY_SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Crop applied to the original image before any styles are produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropOriginal {
    /// Width of the crop rectangle.
    pub width: Number,

    /// Height of the crop rectangle.
    pub height: Number,

    /// Left edge of the crop rectangle.
    pub x: Number,

    /// Top edge of the crop rectangle.
    pub y: Number,
}

impl CropOriginal {
    /// Create a crop rectangle from integer dimensions.
    pub fn new(width: u64, height: u64, x: u64, y: u64) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Rotation applied to the original image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateOriginal {
    /// Rotation angle in degrees.
    pub angle: Number,

    /// Fill color for the uncovered corners, e.g. `#ffffff`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl RotateOriginal {
    /// Create a rotation by an integer number of degrees with no background color.
    pub fn new(angle: i64) -> Self {
        Self {
            angle: angle.into(),
            background_color: None,
        }
    }

    /// Set the background color.
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }
}

/// The processing instructions for image-butler, authenticated with the shared secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    version: String,

    /// Milliseconds since the epoch.
    timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    styles: Option<BTreeMap<String, String>>,

    #[serde(default)]
    callback_data: Map<String, Value>,

    callback_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    crop_original: Option<CropOriginal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotate_original: Option<RotateOriginal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

/// The already-validated parts of a configuration, before signing.
#[derive(Debug)]
pub(crate) struct UnsignedConfig {
    pub(crate) timestamp: i64,
    pub(crate) styles: Option<BTreeMap<String, String>>,
    pub(crate) callback_data: Map<String, Value>,
    pub(crate) callback_url: String,
    pub(crate) crop_original: Option<CropOriginal>,
    pub(crate) rotate_original: Option<RotateOriginal>,
}

impl UnsignedConfig {
    /// Sign the configuration with the shared secret.
    pub(crate) fn sign(self, secret: &[u8]) -> Result<ProcessingConfig, serde_json::Error> {
        let mut config = ProcessingConfig {
            version: CONFIG_VERSION.to_string(),
            timestamp: self.timestamp,
            styles: self.styles,
            callback_data: self.callback_data,
            callback_url: self.callback_url,
            crop_original: self.crop_original,
            rotate_original: self.rotate_original,
            signature: None,
        };

        config.signature = Some(config.expected_signature(secret)?);
        Ok(config)
    }
}

impl ProcessingConfig {
    /// The protocol version, always `1.0` for configurations produced by this crate.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Creation time in milliseconds since the epoch.
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The thumbnails to produce, keyed by style name.
    #[inline]
    pub fn styles(&self) -> Option<&BTreeMap<String, String>> {
        self.styles.as_ref()
    }

    /// Opaque data returned verbatim to the callback.
    #[inline]
    pub fn callback_data(&self) -> &Map<String, Value> {
        &self.callback_data
    }

    /// The URL notified on completion or error.
    #[inline]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    #[inline]
    pub fn crop_original(&self) -> Option<&CropOriginal> {
        self.crop_original.as_ref()
    }

    #[inline]
    pub fn rotate_original(&self) -> Option<&RotateOriginal> {
        self.rotate_original.as_ref()
    }

    /// The hex HMAC-SHA256 signature, if the configuration has been signed.
    #[inline]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Canonical JSON of the configuration with the signature removed. These are the bytes that get signed.
    pub fn unsigned_json(&self) -> Result<String, serde_json::Error> {
        let unsigned = Self {
            signature: None,
            ..self.clone()
        };
        serde_json::to_string(&unsigned)
    }

    fn expected_signature(&self, secret: &[u8]) -> Result<String, serde_json::Error> {
        let json = self.unsigned_json()?;
        trace!("Signing processing configuration: {}", json);
        Ok(hmac_sha256_hex(secret, json.as_bytes()))
    }

    /// Check the embedded signature against one recomputed with `secret`.
    pub fn verify(&self, secret: &[u8]) -> Result<(), KeyVerificationError> {
        let provided = self.signature.as_deref().ok_or(KeyVerificationError::MissingSignature)?;
        let expected = self.expected_signature(secret)?;

        if signatures_match(provided, &expected) {
            Ok(())
        } else {
            debug!("Processing configuration signature mismatch");
            Err(KeyVerificationError::SignatureMismatch)
        }
    }

    /// The base64 segment embedded in the upload key.
    pub(crate) fn to_key_segment(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(KEY_SEGMENT_ENGINE.encode(json))
    }
}

/// Decode and authenticate the processing configuration embedded in an upload key.
///
/// This is what the image-butler worker does with the key of each uploaded object: split the key on `/`,
/// base64-decode the configuration segment, parse it, and reject it unless the HMAC-SHA256 over the configuration
/// without its signature matches the embedded signature. The key may be the template returned by
/// [`PathEncoder::key_template`][crate::PathEncoder::key_template] or the key after the client has resolved the
/// placeholders.
///
/// # Errors
/// Returns a [`KeyVerificationError`] if the key has no configuration segment, the segment cannot be decoded, or the
/// signature does not match.
pub fn decode_key(key: &str, secret: &[u8]) -> Result<ProcessingConfig, KeyVerificationError> {
    let segment = key.split('/').nth(KEY_CONFIG_SEGMENT).filter(|s| !s.is_empty()).ok_or_else(|| {
        debug!("decode_key: key has no configuration segment: {}", key);
        KeyVerificationError::MalformedKey
    })?;

    let json = KEY_SEGMENT_ENGINE.decode(segment)?;
    let config: ProcessingConfig = serde_json::from_slice(&json)?;
    config.verify(secret)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use {
        super::{decode_key, CropOriginal, RotateOriginal, UnsignedConfig, KEY_SEGMENT_ENGINE},
        crate::KeyVerificationError,
        base64::Engine,
        serde_json::{json, Map, Value},
        std::collections::BTreeMap,
    };

    fn sample(secret: &[u8]) -> super::ProcessingConfig {
        let mut styles = BTreeMap::new();
        styles.insert("thumb".to_string(), "100x100".to_string());
        styles.insert("bigThumb".to_string(), "200x200".to_string());

        let mut callback_data = Map::new();
        callback_data.insert("song".to_string(), Value::from("the cat came back"));

        UnsignedConfig {
            timestamp: 1_640_735_970_000,
            styles: Some(styles),
            callback_data,
            callback_url: "http://example.com".to_string(),
            crop_original: Some(CropOriginal::new(100, 200, 0, 0)),
            rotate_original: Some(RotateOriginal::new(90).with_background_color("#fff")),
        }
        .sign(secret)
        .unwrap()
    }

    #[test_log::test]
    fn test_canonical_field_order() {
        let config = sample(b"secret");
        assert_eq!(
            config.unsigned_json().unwrap(),
            concat!(
                r#"{"version":"1.0","timestamp":1640735970000,"styles":{"bigThumb":"200x200","thumb":"100x100"},"#,
                r#""callbackData":{"song":"the cat came back"},"callbackUrl":"http://example.com","#,
                r#""cropOriginal":{"width":100,"height":200,"x":0,"y":0},"#,
                r##""rotateOriginal":{"angle":90,"backgroundColor":"#fff"}}"##
            )
        );
    }

    #[test_log::test]
    fn test_optional_fields_omitted() {
        let config = UnsignedConfig {
            timestamp: 1,
            styles: None,
            callback_data: Map::new(),
            callback_url: "http://example.com".to_string(),
            crop_original: None,
            rotate_original: None,
        }
        .sign(b"a")
        .unwrap();

        assert_eq!(
            config.unsigned_json().unwrap(),
            r#"{"version":"1.0","timestamp":1,"callbackData":{},"callbackUrl":"http://example.com"}"#
        );
        assert_eq!(config.signature().map(str::len), Some(64));
    }

    #[test_log::test]
    fn test_decode_round_trip_verifies() {
        let config = sample(b"secret");
        let segment = config.to_key_segment().unwrap();
        let key = format!("uploads/{{timestamp}}/{{unique_id}}/{}/{{filename}}.{{extension}}", segment);

        let decoded = decode_key(&key, b"secret").unwrap();
        assert_eq!(decoded, config);
        assert_eq!(decoded.callback_data()["song"], json!("the cat came back"));

        match decode_key(&key, b"other-secret") {
            Err(KeyVerificationError::SignatureMismatch) => (),
            other => panic!("Expected SignatureMismatch; got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_decode_rejects_tampering() {
        let config = sample(b"secret");
        let json = serde_json::to_string(&config).unwrap().replace("http://example.com", "http://evil.example.com");
        let key = format!("uploads/1/2/{}/photo.jpg", KEY_SEGMENT_ENGINE.encode(json));

        match decode_key(&key, b"secret") {
            Err(KeyVerificationError::SignatureMismatch) => (),
            other => panic!("Expected SignatureMismatch; got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_decode_errors() {
        assert!(matches!(decode_key("uploads/1/2", b"s"), Err(KeyVerificationError::MalformedKey)));
        assert!(matches!(decode_key("uploads/1/2//x.jpg", b"s"), Err(KeyVerificationError::MalformedKey)));
        assert!(matches!(decode_key("uploads/1/2/!!!/x.jpg", b"s"), Err(KeyVerificationError::InvalidBase64(_))));

        let not_config = KEY_SEGMENT_ENGINE.encode(br#"{"hello":"world"}"#);
        let key = format!("uploads/1/2/{}/x.jpg", not_config);
        assert!(matches!(decode_key(&key, b"s"), Err(KeyVerificationError::InvalidJson(_))));

        let unsigned = KEY_SEGMENT_ENGINE.encode(br#"{"version":"1.0","timestamp":1,"callbackUrl":"http://a.b"}"#);
        let key = format!("uploads/1/2/{}/x.jpg", unsigned);
        assert!(matches!(decode_key(&key, b"s"), Err(KeyVerificationError::MissingSignature)));
    }

    #[test_log::test]
    fn test_key_segment_has_no_slash() {
        let mut callback_data = Map::new();
        callback_data.insert("blob".to_string(), Value::from("???>>>???>>>"));
        let config = UnsignedConfig {
            timestamp: 0,
            styles: None,
            callback_data,
            callback_url: "http://example.com/?q=~~~".to_string(),
            crop_original: None,
            rotate_original: None,
        }
        .sign(b"s")
        .unwrap();

        let segment = config.to_key_segment().unwrap();
        assert!(!segment.contains('/'));
        assert!(!segment.contains('+'));
    }
}
