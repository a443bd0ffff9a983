use {
    crate::{CropOriginal, RotateOriginal, ValidationError},
    derive_builder::Builder,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    std::collections::BTreeMap,
};

/// Typed options for [`UploadForm`][crate::UploadForm] and [`PathEncoder`][crate::PathEncoder].
///
/// These serialize to the same options object the `new` constructors accept, so every option goes through the same
/// validation. Use [`UploadFormOptionsBuilder`] to construct them programmatically, or deserialize them from a JSON
/// document.
///
/// ```
/// use image_butler_form::{UploadForm, UploadFormOptions};
///
/// let options = UploadFormOptions::builder()
///     .image_butler_secret("a")
///     .aws_access_key_id("b")
///     .aws_secret_access_key("c")
///     .aws_region("us-west-1")
///     .s3_bucket("temporary-upload-bucket")
///     .callback_url("http://example.com")
///     .style("thumb", "100x100")
///     .build()
///     .unwrap();
///
/// let form = UploadForm::from_typed(&options).unwrap();
/// assert_eq!(form.form_fields().action(), "https://temporary-upload-bucket.s3.amazonaws.com/");
/// ```
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(into, strip_option), default)]
#[serde(rename_all = "camelCase")]
pub struct UploadFormOptions {
    /// Secret shared with image-butler (`IB_SECRET`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_butler_secret: Option<String>,

    /// AWS access key id with write access to the upload bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws_access_key_id: Option<String>,

    /// AWS secret access key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws_secret_access_key: Option<String>,

    /// AWS region of the upload bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws_region: Option<String>,

    /// Temporary S3 bucket watched by image-butler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s3_bucket: Option<String>,

    /// Thumbnails to produce, keyed by style name. Example: `thumb` => `100x100`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    styles: Option<BTreeMap<String, String>>,

    /// URL to call back on error or completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    callback_url: Option<String>,

    /// Data returned unmodified to the callback URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    callback_data: Option<Map<String, Value>>,

    /// Crop applied to the original image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crop_original: Option<CropOriginal>,

    /// Rotation applied to the original image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotate_original: Option<RotateOriginal>,
}

impl UploadFormOptions {
    /// Create a [UploadFormOptionsBuilder] to construct [UploadFormOptions].
    #[inline]
    pub fn builder() -> UploadFormOptionsBuilder {
        UploadFormOptionsBuilder::default()
    }

    /// Convert to the options object accepted by the `new` constructors.
    pub fn to_value(&self) -> Result<Value, ValidationError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl UploadFormOptionsBuilder {
    /// Add a single style, keeping any styles already set.
    pub fn style<N: Into<String>, G: Into<String>>(&mut self, name: N, geometry: G) -> &mut Self {
        self.styles
            .get_or_insert_with(|| Some(BTreeMap::new()))
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), geometry.into());
        self
    }

    /// Add a single callback data entry, keeping any entries already set.
    pub fn callback_datum<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> &mut Self {
        self.callback_data
            .get_or_insert_with(|| Some(Map::new()))
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}
