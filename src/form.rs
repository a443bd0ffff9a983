use {
    crate::{constants::*, KSecretKey, PathEncoder, PostPolicy, UploadFormOptions, ValidationError},
    chrono::{DateTime, Utc},
    log::{debug, trace},
    serde::Serialize,
    serde_json::{Map, Value},
    std::borrow::Cow,
};

/// The fields of a browser-based S3 POST upload form.
///
/// Serializes to a flat JSON object keyed by the form field names, with `x-amz-expires` as a number. The file input
/// itself is not included; it must be the last field of the submitted form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormFields {
    action: String,
    key: String,
    acl: &'static str,
    #[serde(rename = "x-amz-algorithm")]
    x_amz_algorithm: &'static str,
    #[serde(rename = "x-amz-date")]
    x_amz_date: String,
    #[serde(rename = "x-amz-expires")]
    x_amz_expires: u32,
    #[serde(rename = "x-amz-credential")]
    x_amz_credential: String,
    policy: String,
    #[serde(rename = "x-amz-signature")]
    x_amz_signature: String,
}

impl FormFields {
    /// The form action: the bucket endpoint, `https://<bucket>.s3.amazonaws.com/`.
    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The object key template.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The canned ACL, always `public-read`.
    #[inline]
    pub fn acl(&self) -> &str {
        self.acl
    }

    /// The signing algorithm, always `AWS4-HMAC-SHA256`.
    #[inline]
    pub fn x_amz_algorithm(&self) -> &str {
        self.x_amz_algorithm
    }

    /// The signing timestamp, `YYYYMMDDTHHMMSSZ`.
    #[inline]
    pub fn x_amz_date(&self) -> &str {
        &self.x_amz_date
    }

    /// Validity of the signature in seconds.
    #[inline]
    pub fn x_amz_expires(&self) -> u32 {
        self.x_amz_expires
    }

    /// The credential, `<access key>/<YYYYMMDD>/<region>/s3/aws4_request`.
    #[inline]
    pub fn x_amz_credential(&self) -> &str {
        &self.x_amz_credential
    }

    /// The base64-encoded policy document.
    #[inline]
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// The hex signature over [`policy`][Self::policy].
    #[inline]
    pub fn x_amz_signature(&self) -> &str {
        &self.x_amz_signature
    }

    /// All fields as name/value pairs, in the order they should appear in the form.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Cow<'_, str>)> {
        [
            (FIELD_ACTION, Cow::Borrowed(self.action.as_str())),
            (FIELD_KEY, Cow::Borrowed(self.key.as_str())),
            (FIELD_ACL, Cow::Borrowed(self.acl)),
            (FIELD_X_AMZ_ALGORITHM, Cow::Borrowed(self.x_amz_algorithm)),
            (FIELD_X_AMZ_DATE, Cow::Borrowed(self.x_amz_date.as_str())),
            (FIELD_X_AMZ_EXPIRES, Cow::Owned(self.x_amz_expires.to_string())),
            (FIELD_X_AMZ_CREDENTIAL, Cow::Borrowed(self.x_amz_credential.as_str())),
            (FIELD_POLICY, Cow::Borrowed(self.policy.as_str())),
            (FIELD_X_AMZ_SIGNATURE, Cow::Borrowed(self.x_amz_signature.as_str())),
        ]
        .into_iter()
    }

    /// Look up a field by its form name.
    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        self.iter().find(|(field, _)| *field == name).map(|(_, value)| value)
    }
}

/// A signed browser-based upload form for image-butler.
///
/// Creating an `UploadForm` validates the AWS options and the image-butler processing options, captures the current
/// time once, and signs the POST policy. Every date in the form (`x-amz-date`, the credential scope, and the policy
/// expiration) derives from that one instant, and [`form_fields`][Self::form_fields] returns the same fields on every
/// call.
#[derive(Clone, Debug)]
pub struct UploadForm {
    path_encoder: PathEncoder,
    policy: PostPolicy,
    fields: FormFields,
}

impl UploadForm {
    /// Create an `UploadForm` from an options object, signed at the current time.
    ///
    /// Required options: `imageButlerSecret`, `awsAccessKeyId`, `awsSecretAccessKey`, `awsRegion`, `s3Bucket`, plus
    /// the options understood by [`PathEncoder::new`].
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidOptions`] if `options` is not an object,
    /// [`ValidationError::MissingOption`] for the first required option (in the order above) that is missing or not a
    /// string, and otherwise any error from [`PathEncoder::new`], unchanged.
    pub fn new(options: &Value) -> Result<Self, ValidationError> {
        Self::new_at(options, Utc::now())
    }

    /// Create an `UploadForm` from typed options, signed at the current time.
    pub fn from_typed(options: &UploadFormOptions) -> Result<Self, ValidationError> {
        Self::new(&options.to_value()?)
    }

    /// Create an `UploadForm` signed at `now`.
    ///
    /// # Errors
    /// As [`new`][Self::new], plus [`ValidationError::SigningTimeOutOfRange`] if `now` is so close to the end of the
    /// representable range that the policy expiration overflows.
    pub fn new_at(options: &Value, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let Value::Object(option_map) = options else {
            debug!("Rejecting upload form options: not an object");
            return Err(ValidationError::InvalidOptions);
        };

        for name in REQUIRED_FORM_OPTIONS {
            required_str(option_map, name)?;
        }

        let path_encoder = PathEncoder::new_at(options, now)?;

        let access_key_id = required_str(option_map, OPT_AWS_ACCESS_KEY_ID)?;
        let secret_access_key = required_str(option_map, OPT_AWS_SECRET_ACCESS_KEY)?;
        let region = required_str(option_map, OPT_AWS_REGION)?;
        let bucket = required_str(option_map, OPT_S3_BUCKET)?;

        let short_date = now.format(ISO8601_DATE_FORMAT).to_string();
        let long_date = now.format(ISO8601_COMPACT_FORMAT).to_string();
        let credential = format!("{}/{}/{}/{}/{}", access_key_id, short_date, region, S3_SERVICE, AWS4_REQUEST);

        let policy = PostPolicy::for_upload(now, bucket, &long_date, &credential).ok_or_else(|| {
            debug!("Rejecting signing time {}: policy expiration out of range", now);
            ValidationError::SigningTimeOutOfRange
        })?;
        let encoded_policy = policy.to_base64()?;
        trace!("Upload policy: {:?}", policy);

        let signing_key = KSecretKey::new(secret_access_key).to_ksigning(now.date_naive(), region, S3_SERVICE);
        let signature = signing_key.sign(encoded_policy.as_bytes());

        let fields = FormFields {
            action: format!("https://{}.s3.amazonaws.com/", bucket),
            key: path_encoder.key_template(),
            acl: ACL_PUBLIC_READ,
            x_amz_algorithm: AWS4_HMAC_SHA256,
            x_amz_date: long_date,
            x_amz_expires: UPLOAD_POLICY_SECONDS,
            x_amz_credential: credential,
            policy: encoded_policy,
            x_amz_signature: signature,
        };

        debug!(
            "Signed upload form: bucket={} region={} x-amz-date={} expiration={}",
            bucket,
            region,
            fields.x_amz_date,
            policy.expiration()
        );

        Ok(Self {
            path_encoder,
            policy,
            fields,
        })
    }

    /// The signed form fields.
    #[inline]
    pub fn form_fields(&self) -> &FormFields {
        &self.fields
    }

    /// The POST policy carried (base64-encoded) in the `policy` field.
    #[inline]
    pub fn policy(&self) -> &PostPolicy {
        &self.policy
    }

    /// The encoder that produced the `key` field.
    #[inline]
    pub fn path_encoder(&self) -> &PathEncoder {
        &self.path_encoder
    }
}

fn required_str<'a>(options: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, ValidationError> {
    match options.get(name) {
        Some(Value::String(value)) => Ok(value),
        _ => {
            debug!("Rejecting upload form options: {} is missing or not a string", name);
            Err(ValidationError::MissingOption(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::UploadForm,
        crate::{KSecretKey, ValidationError},
        base64::{engine::general_purpose::STANDARD, Engine},
        chrono::{DateTime, Duration, NaiveDate, Utc},
        serde_json::{json, Value},
    };

    fn test_instant() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2021, 12, 28).unwrap().and_hms_opt(23, 59, 30).unwrap().and_utc()
    }

    fn test_options() -> Value {
        json!({
            "imageButlerSecret": "a",
            "awsAccessKeyId": "b",
            "awsSecretAccessKey": "c",
            "awsRegion": "us-west-1",
            "s3Bucket": "temporary-upload-bucket",
            "callbackUrl": "http://example.com",
        })
    }

    #[test_log::test]
    fn test_fields_share_one_instant() {
        let form = UploadForm::new_at(&test_options(), test_instant()).unwrap();
        let fields = form.form_fields();

        assert_eq!(fields.action(), "https://temporary-upload-bucket.s3.amazonaws.com/");
        assert_eq!(fields.acl(), "public-read");
        assert_eq!(fields.x_amz_algorithm(), "AWS4-HMAC-SHA256");
        assert_eq!(fields.x_amz_date(), "20211228T235930Z");
        assert_eq!(fields.x_amz_expires(), 604800);
        assert_eq!(fields.x_amz_credential(), "b/20211228/us-west-1/s3/aws4_request");
        assert_eq!(form.policy().expiration(), "2022-01-04T23:59:30Z");
        assert_eq!(form.path_encoder().config().timestamp(), 1_640_735_970_000);
    }

    #[test_log::test]
    fn test_policy_field_matches_fields() {
        let form = UploadForm::new_at(&test_options(), test_instant()).unwrap();
        let fields = form.form_fields();

        let policy: Value = serde_json::from_slice(&STANDARD.decode(fields.policy()).unwrap()).unwrap();
        assert_eq!(
            policy,
            json!({
                "expiration": "2022-01-04T23:59:30Z",
                "conditions": [
                    ["starts-with", "$key", "uploads/"],
                    {"bucket": "temporary-upload-bucket"},
                    {"acl": fields.acl()},
                    {"x-amz-algorithm": fields.x_amz_algorithm()},
                    {"x-amz-date": fields.x_amz_date()},
                    {"x-amz-credential": fields.x_amz_credential()},
                ]
            })
        );
        assert!(fields.key().starts_with("uploads/"));
    }

    #[test_log::test]
    fn test_signature_over_base64_policy() {
        let form = UploadForm::new_at(&test_options(), test_instant()).unwrap();
        let fields = form.form_fields();

        let date = NaiveDate::from_ymd_opt(2021, 12, 28).unwrap();
        let signing_key = KSecretKey::new("c").to_ksigning(date, "us-west-1", "s3");
        assert_eq!(fields.x_amz_signature(), signing_key.sign(fields.policy().as_bytes()));
        assert_ne!(fields.x_amz_signature(), signing_key.sign(&STANDARD.decode(fields.policy()).unwrap()));
    }

    #[test_log::test]
    fn test_idempotent() {
        let form = UploadForm::new(&test_options()).unwrap();
        assert_eq!(form.form_fields().clone(), form.form_fields().clone());

        let a = UploadForm::new_at(&test_options(), test_instant()).unwrap();
        let b = UploadForm::new_at(&test_options(), test_instant()).unwrap();
        assert_eq!(a.form_fields(), b.form_fields());
    }

    #[test_log::test]
    fn test_serialized_fields() {
        let form = UploadForm::new_at(&test_options(), test_instant()).unwrap();
        let fields = form.form_fields();
        let value = serde_json::to_value(fields).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 9);
        assert_eq!(object["x-amz-expires"], json!(604800));
        assert_eq!(object["x-amz-credential"], "b/20211228/us-west-1/s3/aws4_request");

        let names: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            [
                "action",
                "key",
                "acl",
                "x-amz-algorithm",
                "x-amz-date",
                "x-amz-expires",
                "x-amz-credential",
                "policy",
                "x-amz-signature"
            ]
        );
        for (name, value) in fields.iter() {
            assert_eq!(object[name].as_str().map(str::to_string).unwrap_or_else(|| object[name].to_string()), value);
        }
        assert_eq!(fields.get("x-amz-expires").as_deref(), Some("604800"));
        assert_eq!(fields.get("file"), None);
    }

    #[test_log::test]
    fn test_missing_options() {
        let required = ["imageButlerSecret", "awsAccessKeyId", "awsSecretAccessKey", "awsRegion", "s3Bucket"];
        for name in required {
            let mut options = test_options();
            options.as_object_mut().unwrap().remove(name);
            let e = UploadForm::new(&options).unwrap_err();
            assert_eq!(e.to_string(), format!("Invalid or missing option: {}", name));

            let mut options = test_options();
            options[name] = json!(1);
            let e = UploadForm::new(&options).unwrap_err();
            assert_eq!(e.to_string(), format!("Invalid or missing option: {}", name));
        }
    }

    #[test_log::test]
    fn test_first_missing_option_wins() {
        let e = UploadForm::new(&json!({"imageButlerSecret": "a", "awsRegion": "c"})).unwrap_err();
        assert_eq!(e.to_string(), "Invalid or missing option: awsAccessKeyId");
    }

    #[test_log::test]
    fn test_not_an_object() {
        for options in [Value::Null, json!("options"), json!([1, 2])] {
            match UploadForm::new(&options) {
                Err(ValidationError::InvalidOptions) => (),
                other => panic!("Expected InvalidOptions; got {:?}", other.map(|_| ())),
            }
        }
        assert_eq!(UploadForm::new(&Value::Null).unwrap_err().to_string(), "Invalid or no options provided");
    }

    #[test_log::test]
    fn test_signing_time_out_of_range() {
        match UploadForm::new_at(&test_options(), DateTime::<Utc>::MAX_UTC) {
            Err(ValidationError::SigningTimeOutOfRange) => (),
            other => panic!("Expected SigningTimeOutOfRange; got {:?}", other.map(|_| ())),
        }

        let last = DateTime::<Utc>::MAX_UTC - Duration::days(7);
        let form = UploadForm::new_at(&test_options(), last).unwrap();
        assert_eq!(form.path_encoder().config().timestamp(), last.timestamp_millis());
    }

    #[test_log::test]
    fn test_path_encoder_errors_propagate() {
        let mut options = test_options();
        options["callbackUrl"] = json!("invalid");
        let e = UploadForm::new(&options).unwrap_err();
        assert!(matches!(e, ValidationError::InvalidCallbackUrl));
        assert_eq!(e.to_string(), "Invalid callbackUrl");
    }
}
