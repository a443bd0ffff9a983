//! Common constants used throughout the crate.
//!
//! Field names and literal values here are a wire contract with S3 and with the image-butler
//! worker that decodes the upload key. Error messages are part of the public contract as well.
//!
//! Tests that are testing the content of an error message should not use these constants;
//! they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically. (This can be a bit hard with comments, etc.)

/// Canned ACL applied to every upload.
pub(crate) const ACL_PUBLIC_READ: &str = "public-read";

/// Algorithm for AWS SigV4
pub(crate) const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

/// Prefix prepended to the secret access key to form `kSecret`.
pub(crate) const AWS4_KEY_PREFIX: &str = "AWS4";

/// String included at the end of the AWS SigV4 credential scope
pub(crate) const AWS4_REQUEST: &str = "aws4_request";

/// Protocol version embedded in every processing configuration.
pub(crate) const CONFIG_VERSION: &str = "1.0";

/// Error code: InternalFailure
pub(crate) const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: InvalidParameterValue
pub(crate) const ERR_CODE_INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";

/// Expiration format required by the POST policy document.
pub(crate) const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Form field: `acl`
pub(crate) const FIELD_ACL: &str = "acl";

/// Form field: `action`
pub(crate) const FIELD_ACTION: &str = "action";

/// Form field (and policy condition): `bucket`
pub(crate) const FIELD_BUCKET: &str = "bucket";

/// Form field: `key`
pub(crate) const FIELD_KEY: &str = "key";

/// Form field: `policy`
pub(crate) const FIELD_POLICY: &str = "policy";

/// Form field: `x-amz-algorithm`
pub(crate) const FIELD_X_AMZ_ALGORITHM: &str = "x-amz-algorithm";

/// Form field: `x-amz-credential`
pub(crate) const FIELD_X_AMZ_CREDENTIAL: &str = "x-amz-credential";

/// Form field: `x-amz-date`
pub(crate) const FIELD_X_AMZ_DATE: &str = "x-amz-date";

/// Form field: `x-amz-expires`
pub(crate) const FIELD_X_AMZ_EXPIRES: &str = "x-amz-expires";

/// Form field: `x-amz-signature`
pub(crate) const FIELD_X_AMZ_SIGNATURE: &str = "x-amz-signature";

/// Compact ISO8601 format used for `x-amz-date`.
pub(crate) const ISO8601_COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Short date format used in the credential scope.
pub(crate) const ISO8601_DATE_FORMAT: &str = "%Y%m%d";

/// Index of the encoded configuration when a key is split on `/`.
pub(crate) const KEY_CONFIG_SEGMENT: usize = 3;

/// Placeholders resolved by the uploading client, before the encoded configuration.
pub(crate) const KEY_PLACEHOLDERS_HEAD: &str = "{timestamp}/{unique_id}";

/// Placeholders resolved by the uploading client, after the encoded configuration.
pub(crate) const KEY_PLACEHOLDERS_TAIL: &str = "{filename}.{extension}";

/// Prefix every upload key must start with.
pub(crate) const KEY_PREFIX: &str = "uploads/";

/// Error message: `"The upload key does not contain an encoded configuration segment"`
pub(crate) const MSG_BAD_KEY: &str = "The upload key does not contain an encoded configuration segment";

/// Error message: `"The configuration segment is not valid base64"`
pub(crate) const MSG_BAD_KEY_BASE64: &str = "The configuration segment is not valid base64";

/// Error message: `"The configuration segment is not a valid processing configuration"`
pub(crate) const MSG_BAD_KEY_JSON: &str = "The configuration segment is not a valid processing configuration";

/// Error message: `"Failed to serialize the processing configuration"`
pub(crate) const MSG_CONFIG_SERIALIZATION: &str = "Failed to serialize the processing configuration";

/// Error message: `"Invalid callbackData"`
pub(crate) const MSG_INVALID_CALLBACK_DATA: &str = "Invalid callbackData";

/// Error message: `"Invalid callbackUrl"`
pub(crate) const MSG_INVALID_CALLBACK_URL: &str = "Invalid callbackUrl";

/// Error message prefix: `"cropOriginal has an invalid or missing "`
pub(crate) const MSG_INVALID_CROP: &str = "cropOriginal has an invalid or missing ";

/// Error message prefix: `"Invalid geometry in config "`
pub(crate) const MSG_INVALID_GEOMETRY: &str = "Invalid geometry in config ";

/// Error message: `"Invalid or missing imageButlerSecret"`
pub(crate) const MSG_INVALID_SECRET: &str = "Invalid or missing imageButlerSecret";

/// Error message: `"rotateOriginal has an invalid or missing angle"`
pub(crate) const MSG_INVALID_ROTATE_ANGLE: &str = "rotateOriginal has an invalid or missing angle";

/// Error message: `"rotateOriginal has an invalid backgroundColor"`
pub(crate) const MSG_INVALID_ROTATE_BACKGROUND: &str = "rotateOriginal has an invalid backgroundColor";

/// Error message prefix: `"Invalid or missing option: "`
pub(crate) const MSG_MISSING_OPTION: &str = "Invalid or missing option: ";

/// Error message: `"The configuration does not carry a signature"`
pub(crate) const MSG_MISSING_SIGNATURE: &str = "The configuration does not carry a signature";

/// Error message: `"Invalid or no options provided"`
pub(crate) const MSG_NO_OPTIONS: &str = "Invalid or no options provided";

/// Error message: `"The configuration signature does not match"`
pub(crate) const MSG_SIGNATURE_MISMATCH: &str = "The configuration signature does not match";

/// Error message: `"Signing time is out of range"`
pub(crate) const MSG_SIGNING_TIME_OUT_OF_RANGE: &str = "Signing time is out of range";

/// Option: the AWS access key id.
pub(crate) const OPT_AWS_ACCESS_KEY_ID: &str = "awsAccessKeyId";

/// Option: the AWS region of the upload bucket.
pub(crate) const OPT_AWS_REGION: &str = "awsRegion";

/// Option: the AWS secret access key.
pub(crate) const OPT_AWS_SECRET_ACCESS_KEY: &str = "awsSecretAccessKey";

/// Option: opaque data returned to the callback.
pub(crate) const OPT_CALLBACK_DATA: &str = "callbackData";

/// Option: the URL notified on completion or error.
pub(crate) const OPT_CALLBACK_URL: &str = "callbackUrl";

/// Option: crop applied to the original image.
pub(crate) const OPT_CROP_ORIGINAL: &str = "cropOriginal";

/// Option: the secret shared with image-butler.
pub(crate) const OPT_IMAGE_BUTLER_SECRET: &str = "imageButlerSecret";

/// Option: rotation applied to the original image.
pub(crate) const OPT_ROTATE_ORIGINAL: &str = "rotateOriginal";

/// Option: the temporary upload bucket.
pub(crate) const OPT_S3_BUCKET: &str = "s3Bucket";

/// Option: thumbnails to produce, keyed by style name.
pub(crate) const OPT_STYLES: &str = "styles";

/// Required [`UploadForm`][crate::UploadForm] options, in the order they are checked.
pub(crate) const REQUIRED_FORM_OPTIONS: [&str; 5] =
    [OPT_IMAGE_BUTLER_SECRET, OPT_AWS_ACCESS_KEY_ID, OPT_AWS_SECRET_ACCESS_KEY, OPT_AWS_REGION, OPT_S3_BUCKET];

/// Service name used in the credential scope.
pub(crate) const S3_SERVICE: &str = "s3";

/// The length of a SHA-256 digest in bytes.
pub(crate) const SHA256_OUTPUT_LEN: usize = 32;

/// Validity window of a signed upload policy, in days. This is the maximum S3 allows.
pub(crate) const UPLOAD_POLICY_DAYS: i64 = 7;

/// Validity window of a signed upload policy, in seconds (`x-amz-expires`).
pub(crate) const UPLOAD_POLICY_SECONDS: u32 = 604_800;
