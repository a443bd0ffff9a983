//! The `image_butler_form` crate produces browser-based S3 POST upload forms for image-butler, an image-processing
//! worker.
//!
//! The browser uploads the file straight to a temporary S3 bucket. The object key carries the processing
//! instructions for image-butler (thumbnail styles, crop, rotation, and where to call back when done) as a base64
//! JSON document signed with a secret shared between this crate's caller and image-butler. image-butler watches the
//! bucket, verifies the signature, and processes the image.
//!
//! Two pieces are involved:
//! * [`PathEncoder`] validates the processing options and builds the key template,
//!   `uploads/{timestamp}/{unique_id}/<config>/{filename}.{extension}`. The brace-delimited placeholders are filled in
//!   by the uploading client.
//! * [`UploadForm`] validates the AWS options and signs a POST policy with AWS SigV4, producing the [`FormFields`]
//!   to render into an HTML form.
//!
//! [`decode_key`] is the inverse operation performed by image-butler.
//!
//! Everything is computed when the form is created, from a single timestamp; nothing here performs I/O.
//!
//! ## Example
//! ```rust
//! use image_butler_form::{decode_key, UploadForm};
//! use serde_json::json;
//!
//! let form = UploadForm::new(&json!({
//!     "imageButlerSecret": "a",
//!     "awsAccessKeyId": "b",
//!     "awsSecretAccessKey": "c",
//!     "awsRegion": "us-west-1",
//!     "s3Bucket": "temporary-upload-bucket",
//!     "styles": {"thumb": "100x100"},
//!     "callbackUrl": "http://example.com",
//! }))
//! .unwrap();
//!
//! let fields = form.form_fields();
//! assert_eq!(fields.action(), "https://temporary-upload-bucket.s3.amazonaws.com/");
//! assert_eq!(fields.acl(), "public-read");
//!
//! for (name, value) in fields.iter() {
//!     println!(r#"<input type="hidden" name="{}" value="{}">"#, name, value);
//! }
//!
//! // What image-butler does with the key of the uploaded object.
//! let config = decode_key(fields.key(), b"a").unwrap();
//! assert_eq!(config.callback_url(), "http://example.com");
//! ```
#![warn(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]

mod config;
mod constants;
mod crypto;
mod error;
mod form;
mod options;
mod path_encoder;
mod policy;
mod signing_key;

pub use crate::{
    config::{decode_key, CropOriginal, ProcessingConfig, RotateOriginal},
    error::{KeyVerificationError, ValidationError},
    form::{FormFields, UploadForm},
    options::{UploadFormOptions, UploadFormOptionsBuilder, UploadFormOptionsBuilderError},
    path_encoder::{is_valid_geometry, PathEncoder},
    policy::{PolicyCondition, PostPolicy},
    signing_key::{KDateKey, KRegionKey, KSecretKey, KServiceKey, KSigningKey},
};
