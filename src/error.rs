use {
    crate::constants::*,
    http::status::StatusCode,
    scratchstack_errors::ServiceError,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Error returned when an [`UploadForm`][crate::UploadForm] or [`PathEncoder`][crate::PathEncoder] cannot be
/// constructed from the supplied options.
///
/// Validation happens entirely at construction time; an instance that exists is always usable. The `Display` text
/// of each variant is stable and identifies the offending option.
#[derive(Debug)]
#[non_exhaustive]
pub enum ValidationError {
    /// The options were not an object. Message: `Invalid or no options provided`
    InvalidOptions,

    /// A required option is missing or is not a string. Message: `Invalid or missing option: <name>`
    MissingOption(/* option name */ &'static str),

    /// The image-butler secret is missing or is not a string. Message: `Invalid or missing imageButlerSecret`
    InvalidSecret,

    /// A style's geometry does not look like `WIDTHx[HEIGHT][modifier]`.
    /// Message: `Invalid geometry in config (<name>: <geometry>)`
    InvalidGeometry {
        /// The style name.
        name: String,

        /// The rejected geometry, as given.
        geometry: String,
    },

    /// The callback URL is missing or is not an absolute URI. Message: `Invalid callbackUrl`
    InvalidCallbackUrl,

    /// The callback data is neither absent nor an object. Message: `Invalid callbackData`
    InvalidCallbackData,

    /// A crop dimension is missing or not numeric. Message: `cropOriginal has an invalid or missing <field>`
    InvalidCrop(/* field name */ &'static str),

    /// The rotation angle is missing or not numeric. Message: `rotateOriginal has an invalid or missing angle`
    InvalidRotateAngle,

    /// The rotation background color is present but not a string.
    /// Message: `rotateOriginal has an invalid backgroundColor`
    InvalidRotateBackgroundColor,

    /// The policy expiration computed from the signing time cannot be represented.
    /// Message: `Signing time is out of range`
    SigningTimeOutOfRange,

    /// The processing configuration or policy could not be serialized.
    Serialization(serde_json::Error),
}

impl ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => ERR_CODE_INTERNAL_FAILURE,
            _ => ERR_CODE_INVALID_PARAMETER_VALUE,
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl ServiceError for ValidationError {
    fn error_code(&self) -> &'static str {
        ValidationError::error_code(self)
    }

    fn http_status(&self) -> StatusCode {
        ValidationError::http_status(self)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::InvalidOptions => f.write_str(MSG_NO_OPTIONS),
            Self::MissingOption(name) => write!(f, "{}{}", MSG_MISSING_OPTION, name),
            Self::InvalidSecret => f.write_str(MSG_INVALID_SECRET),
            Self::InvalidGeometry {
                name,
                geometry,
            } => write!(f, "{}({}: {})", MSG_INVALID_GEOMETRY, name, geometry),
            Self::InvalidCallbackUrl => f.write_str(MSG_INVALID_CALLBACK_URL),
            Self::InvalidCallbackData => f.write_str(MSG_INVALID_CALLBACK_DATA),
            Self::InvalidCrop(field) => write!(f, "{}{}", MSG_INVALID_CROP, field),
            Self::InvalidRotateAngle => f.write_str(MSG_INVALID_ROTATE_ANGLE),
            Self::InvalidRotateBackgroundColor => f.write_str(MSG_INVALID_ROTATE_BACKGROUND),
            Self::SigningTimeOutOfRange => f.write_str(MSG_SIGNING_TIME_OUT_OF_RANGE),
            Self::Serialization(e) => write!(f, "{}: {}", MSG_CONFIG_SERIALIZATION, e),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(e: serde_json::Error) -> ValidationError {
        ValidationError::Serialization(e)
    }
}

/// Error returned by [`decode_key`][crate::decode_key] when an upload key does not carry a valid, authentic
/// processing configuration.
#[derive(Debug)]
#[non_exhaustive]
pub enum KeyVerificationError {
    /// The key has no configuration segment.
    MalformedKey,

    /// The configuration segment is not valid base64.
    InvalidBase64(base64::DecodeError),

    /// The decoded segment is not a processing configuration.
    InvalidJson(serde_json::Error),

    /// The configuration has no `signature` field.
    MissingSignature,

    /// The recomputed signature differs from the embedded one.
    SignatureMismatch,
}

impl Display for KeyVerificationError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::MalformedKey => f.write_str(MSG_BAD_KEY),
            Self::InvalidBase64(_) => f.write_str(MSG_BAD_KEY_BASE64),
            Self::InvalidJson(_) => f.write_str(MSG_BAD_KEY_JSON),
            Self::MissingSignature => f.write_str(MSG_MISSING_SIGNATURE),
            Self::SignatureMismatch => f.write_str(MSG_SIGNATURE_MISMATCH),
        }
    }
}

impl Error for KeyVerificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBase64(ref e) => Some(e),
            Self::InvalidJson(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for KeyVerificationError {
    fn from(e: base64::DecodeError) -> KeyVerificationError {
        KeyVerificationError::InvalidBase64(e)
    }
}

impl From<serde_json::Error> for KeyVerificationError {
    fn from(e: serde_json::Error) -> KeyVerificationError {
        KeyVerificationError::InvalidJson(e)
    }
}
