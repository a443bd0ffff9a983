use {
    crate::{
        config::UnsignedConfig, constants::*, CropOriginal, ProcessingConfig, RotateOriginal, UploadFormOptions,
        ValidationError,
    },
    chrono::{DateTime, Utc},
    http::Uri,
    lazy_static::lazy_static,
    log::{debug, trace},
    regex::Regex,
    serde_json::{Map, Number, Value},
    std::collections::BTreeMap,
};

lazy_static! {
    /// ImageMagick geometry: width, `x`, optional height, optional modifier. Matched anywhere in the string.
    /// Digits are ASCII only.
    static ref GEOMETRY_REGEX: Regex = Regex::new(r"[0-9]+x[0-9]*[><#@%^!]?").unwrap();
}

/// Builds upload keys that carry a signed image-butler processing configuration.
///
/// The key looks like `uploads/{timestamp}/{unique_id}/<config>/{filename}.{extension}`. The brace-delimited
/// segments are placeholders filled in by the uploading client (e.g. jQuery File Upload); `<config>` is the base64
/// JSON [`ProcessingConfig`], signed with the secret shared with image-butler.
///
/// All options are validated when the encoder is created, and the configuration is signed at that point with a
/// single timestamp. [`key_template`][Self::key_template] always returns the same string for a given encoder.
#[derive(Clone, Debug)]
pub struct PathEncoder {
    config: ProcessingConfig,
    key_segment: String,
}

impl PathEncoder {
    /// Create a `PathEncoder` from an options object, using the current time.
    ///
    /// Recognized options: `imageButlerSecret` (required string), `styles` (object of style name to geometry),
    /// `callbackUrl` (required absolute URI), `callbackData` (object), `cropOriginal` (`{width, height, x, y}`),
    /// `rotateOriginal` (`{angle, backgroundColor?}`).
    ///
    /// The options are read strictly. `styles`, `cropOriginal` and `rotateOriginal` values that are not objects
    /// (including `null`) are treated as absent and left out of the configuration. `callbackData` that is absent or
    /// `null` becomes `{}`; any other value that is not an object is rejected rather than passed through.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found, checking the secret, styles, callback URL, callback data, crop,
    /// and rotation in that order.
    pub fn new(options: &Value) -> Result<Self, ValidationError> {
        Self::new_at(options, Utc::now())
    }

    /// Create a `PathEncoder` from typed options, using the current time.
    pub fn from_typed(options: &UploadFormOptions) -> Result<Self, ValidationError> {
        Self::new(&options.to_value()?)
    }

    /// Create a `PathEncoder` whose configuration is timestamped with `now`.
    pub fn new_at(options: &Value, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let secret = validate_secret(options)?;
        let styles = validate_styles(options)?;
        let callback_url = validate_callback_url(options)?;
        let callback_data = validate_callback_data(options)?;
        let crop_original = validate_crop(options)?;
        let rotate_original = validate_rotate(options)?;

        let config = UnsignedConfig {
            timestamp: now.timestamp_millis(),
            styles,
            callback_data,
            callback_url,
            crop_original,
            rotate_original,
        }
        .sign(secret.as_bytes())?;

        let key_segment = config.to_key_segment()?;
        debug!("Created path encoder: timestamp={} callback_url={}", config.timestamp(), config.callback_url());

        Ok(Self {
            config,
            key_segment,
        })
    }

    /// The upload key with client-side placeholders:
    /// `uploads/{timestamp}/{unique_id}/<config>/{filename}.{extension}`.
    pub fn key_template(&self) -> String {
        format!("{}{}/{}/{}", KEY_PREFIX, KEY_PLACEHOLDERS_HEAD, self.key_segment, KEY_PLACEHOLDERS_TAIL)
    }

    /// The signed configuration embedded in the key.
    #[inline]
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }
}

fn validate_secret(options: &Value) -> Result<&str, ValidationError> {
    match options.get(OPT_IMAGE_BUTLER_SECRET) {
        Some(Value::String(secret)) => Ok(secret),
        _ => {
            debug!("Rejecting options: {} is missing or not a string", OPT_IMAGE_BUTLER_SECRET);
            Err(ValidationError::InvalidSecret)
        }
    }
}

/// Whether `geometry` contains an ImageMagick resize geometry.
pub fn is_valid_geometry(geometry: &str) -> bool {
    GEOMETRY_REGEX.is_match(geometry)
}

fn validate_styles(options: &Value) -> Result<Option<BTreeMap<String, String>>, ValidationError> {
    let Some(Value::Object(styles)) = options.get(OPT_STYLES) else {
        return Ok(None);
    };

    let mut result = BTreeMap::new();
    for (name, geometry) in styles {
        match geometry {
            Value::String(geometry) if is_valid_geometry(geometry) => {
                result.insert(name.clone(), geometry.clone());
            }
            other => {
                let geometry = match other {
                    Value::String(s) => s.clone(),
                    _ => other.to_string(),
                };
                debug!("Rejecting style {}: invalid geometry {}", name, geometry);
                return Err(ValidationError::InvalidGeometry {
                    name: name.clone(),
                    geometry,
                });
            }
        }
    }

    trace!("Validated {} style(s)", result.len());
    Ok(Some(result))
}

fn validate_callback_url(options: &Value) -> Result<String, ValidationError> {
    let Some(Value::String(url)) = options.get(OPT_CALLBACK_URL) else {
        debug!("Rejecting options: {} is missing or not a string", OPT_CALLBACK_URL);
        return Err(ValidationError::InvalidCallbackUrl);
    };

    match url.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() && uri.authority().is_some() => Ok(url.clone()),
        Ok(_) => {
            debug!("Rejecting callback URL {}: not an absolute URI", url);
            Err(ValidationError::InvalidCallbackUrl)
        }
        Err(e) => {
            debug!("Rejecting callback URL {}: {}", url, e);
            Err(ValidationError::InvalidCallbackUrl)
        }
    }
}

fn validate_callback_data(options: &Value) -> Result<Map<String, Value>, ValidationError> {
    match options.get(OPT_CALLBACK_DATA) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(data)) => Ok(data.clone()),
        Some(_) => {
            debug!("Rejecting options: {} is not an object", OPT_CALLBACK_DATA);
            Err(ValidationError::InvalidCallbackData)
        }
    }
}

fn number_field(object: &Map<String, Value>, field: &str) -> Option<Number> {
    match object.get(field) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn validate_crop(options: &Value) -> Result<Option<CropOriginal>, ValidationError> {
    let Some(Value::Object(crop)) = options.get(OPT_CROP_ORIGINAL) else {
        return Ok(None);
    };

    let field = |name: &'static str| {
        number_field(crop, name).ok_or_else(|| {
            debug!("Rejecting {}: {} is missing or not a number", OPT_CROP_ORIGINAL, name);
            ValidationError::InvalidCrop(name)
        })
    };

    // Checked in declaration order: width, height, x, y.
    Ok(Some(CropOriginal {
        width: field("width")?,
        height: field("height")?,
        x: field("x")?,
        y: field("y")?,
    }))
}

fn validate_rotate(options: &Value) -> Result<Option<RotateOriginal>, ValidationError> {
    let Some(Value::Object(rotate)) = options.get(OPT_ROTATE_ORIGINAL) else {
        return Ok(None);
    };

    let angle = number_field(rotate, "angle").ok_or_else(|| {
        debug!("Rejecting {}: angle is missing or not a number", OPT_ROTATE_ORIGINAL);
        ValidationError::InvalidRotateAngle
    })?;

    let background_color = match rotate.get("backgroundColor") {
        None => None,
        Some(Value::String(color)) => Some(color.clone()),
        Some(_) => {
            debug!("Rejecting {}: backgroundColor is not a string", OPT_ROTATE_ORIGINAL);
            return Err(ValidationError::InvalidRotateBackgroundColor);
        }
    };

    Ok(Some(RotateOriginal {
        angle,
        background_color,
    }))
}
