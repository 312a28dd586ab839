use std::borrow::Cow;
use std::collections::HashMap;

use intake_core::config::ValidationConfig;
use intake_core::{FileCategory, RuleConstraint, UploadError, ValidationRule};

use crate::mime::{essence, extension_of, extensions_for, OCTET_STREAM};

/// Validation failures. Each message names the field the way it is shown to users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("The {field} field is required.")]
    Required { field: String },

    #[error("The {field} field must be a file.")]
    NotAFile { field: String },

    #[error("The {field} field must be an image.")]
    NotAnImage { field: String },

    #[error("The {field} field must be a file of type: {}.", allowed.join(", "))]
    InvalidType { field: String, allowed: Vec<String> },

    #[error("The {field} field must not be greater than {max} kilobytes.")]
    TooLarge { field: String, max: u64 },

    #[error("The {field} field must be at least {min} kilobytes.")]
    TooSmall { field: String, min: u64 },

    #[error("Invalid validation rule for {field}: {message}")]
    InvalidRule { field: String, message: String },
}

impl From<ValidationError> for UploadError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidRule { .. } => UploadError::InvalidInput(err.to_string()),
            other => UploadError::Validation(other.to_string()),
        }
    }
}

/// What the validator needs to know about an incoming file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub size: u64,
    /// Detected MIME type.
    pub mime_type: String,
    /// Name supplied by the client or derived from the URL.
    pub original_name: String,
}

impl FileFacts {
    pub fn new(size: u64, mime_type: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self {
            size,
            mime_type: mime_type.into(),
            original_name: original_name.into(),
        }
    }

    /// Extensions the content may legitimately carry.
    ///
    /// Derived from the MIME type when the content was recognised, else from the
    /// client file name.
    fn candidate_extensions(&self) -> Vec<String> {
        let mime = essence(&self.mime_type);
        let from_mime = if mime == OCTET_STREAM {
            Vec::new()
        } else {
            extensions_for(&mime)
        };
        if from_mime.is_empty() {
            extension_of(&self.original_name).into_iter().collect()
        } else {
            from_mime
        }
    }
}

/// Rule-based upload validator
///
/// Rule resolution order for a field:
/// 1. a per-call custom rule for the field
/// 2. a configured rule for the field
/// 3. the configured rule for the file's MIME category
/// 4. the fallback rule
///
/// Only the first violated constraint is reported.
#[derive(Debug, Clone)]
pub struct FileValidator {
    rules: ValidationConfig,
}

fn display_name(field: &str) -> String {
    field.replace('_', " ")
}

fn mime_matches(mime: &str, pattern: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(family) => mime
            .split_once('/')
            .map(|(f, _)| f == family)
            .unwrap_or(false),
        None => mime == pattern,
    }
}

impl FileValidator {
    pub fn new(rules: ValidationConfig) -> Self {
        Self { rules }
    }

    /// Pick the rule that applies to `field` for a file of type `mime_type`.
    pub fn resolve_rule<'a>(
        &'a self,
        field: &str,
        mime_type: Option<&str>,
        custom_rules: &HashMap<String, String>,
    ) -> Result<Cow<'a, ValidationRule>, ValidationError> {
        if let Some(raw) = custom_rules.get(field) {
            let rule = raw
                .parse::<ValidationRule>()
                .map_err(|e| ValidationError::InvalidRule {
                    field: field.to_string(),
                    message: e.to_string(),
                })?;
            return Ok(Cow::Owned(rule));
        }

        if let Some(rule) = self.rules.custom_fields.get(field) {
            return Ok(Cow::Borrowed(rule));
        }

        let category = mime_type
            .map(FileCategory::from_mime)
            .unwrap_or(FileCategory::Other);
        Ok(Cow::Borrowed(
            self.rules
                .for_category(category.rule_key())
                .unwrap_or(&self.rules.other),
        ))
    }

    /// Validate a file, or its absence when `file` is `None`.
    pub fn validate(
        &self,
        file: Option<&FileFacts>,
        field: &str,
        custom_rules: &HashMap<String, String>,
    ) -> Result<(), ValidationError> {
        let rule = self.resolve_rule(field, file.map(|f| f.mime_type.as_str()), custom_rules)?;
        let name = display_name(field);

        // An empty upload counts as a missing file.
        let file = match file.filter(|f| f.size > 0) {
            Some(file) => file,
            None if rule.is_required() => {
                return Err(ValidationError::Required { field: name })
            }
            None => return Ok(()),
        };

        let mime = essence(&file.mime_type);
        let size_kb = file.size as f64 / 1024.0;

        for constraint in rule.constraints() {
            match constraint {
                RuleConstraint::Required | RuleConstraint::Nullable | RuleConstraint::File => {}
                RuleConstraint::Image => {
                    if !mime.starts_with("image/") || mime == "image/svg+xml" {
                        return Err(ValidationError::NotAnImage { field: name });
                    }
                }
                RuleConstraint::Mimes(allowed) => {
                    let candidates = file.candidate_extensions();
                    if !candidates.iter().any(|ext| allowed.contains(ext)) {
                        return Err(ValidationError::InvalidType {
                            field: name,
                            allowed: allowed.clone(),
                        });
                    }
                }
                RuleConstraint::MimeTypes(allowed) => {
                    if !allowed.iter().any(|pattern| mime_matches(&mime, pattern)) {
                        return Err(ValidationError::InvalidType {
                            field: name,
                            allowed: allowed.clone(),
                        });
                    }
                }
                RuleConstraint::Max(max) => {
                    if size_kb > *max as f64 {
                        return Err(ValidationError::TooLarge {
                            field: name,
                            max: *max,
                        });
                    }
                }
                RuleConstraint::Min(min) => {
                    if size_kb < *min as f64 {
                        return Err(ValidationError::TooSmall {
                            field: name,
                            min: *min,
                        });
                    }
                }
            }
        }

        tracing::debug!(field = %field, rule = %rule, size_bytes = file.size, "File passed validation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::Config;

    fn validator() -> FileValidator {
        FileValidator::new(Config::default().validation)
    }

    fn png(size: u64) -> FileFacts {
        FileFacts::new(size, "image/png", "photo.png")
    }

    fn no_rules() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_valid_image_passes() {
        assert!(validator()
            .validate(Some(&png(100 * 1024)), "file", &no_rules())
            .is_ok());
    }

    #[test]
    fn test_image_over_limit_fails_with_kilobyte_message() {
        let err = validator()
            .validate(Some(&png(3 * 1024 * 1024)), "file", &no_rules())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The file field must not be greater than 2048 kilobytes."
        );
    }

    #[test]
    fn test_custom_rule_takes_precedence() {
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "required|max:1".to_string());
        let err = validator()
            .validate(Some(&png(2048)), "file", &custom)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The file field must not be greater than 1 kilobytes."
        );
    }

    #[test]
    fn test_field_rule_beats_category_rule() {
        let mut config = Config::default().validation;
        config.custom_fields.insert(
            "resume".to_string(),
            "required|mimes:pdf|max:4096".parse().unwrap(),
        );
        let validator = FileValidator::new(config);

        let err = validator
            .validate(Some(&png(1024)), "resume", &no_rules())
            .unwrap_err();
        assert_eq!(err.to_string(), "The resume field must be a file of type: pdf.");

        let pdf = FileFacts::new(1024, "application/pdf", "cv.pdf");
        assert!(validator.validate(Some(&pdf), "resume", &no_rules()).is_ok());
    }

    #[test]
    fn test_category_rule_is_selected_by_mime() {
        let video = FileFacts::new(30 * 1024 * 1024, "video/mp4", "clip.mp4");
        let err = validator()
            .validate(Some(&video), "file", &no_rules())
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { max: 20480, .. }));

        let doc = FileFacts::new(1024, "application/zip", "a.zip");
        assert!(validator().validate(Some(&doc), "file", &no_rules()).is_ok());
    }

    #[test]
    fn test_missing_file_is_required() {
        let err = validator().validate(None, "user_avatar", &no_rules()).unwrap_err();
        assert_eq!(err.to_string(), "The user avatar field is required.");

        let empty = FileFacts::new(0, "image/png", "a.png");
        assert!(matches!(
            validator().validate(Some(&empty), "file", &no_rules()),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_nullable_allows_missing_file() {
        let mut custom = HashMap::new();
        custom.insert("avatar".to_string(), "nullable|image|max:10".to_string());
        assert!(validator().validate(None, "avatar", &custom).is_ok());
    }

    #[test]
    fn test_first_violation_only() {
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "required|image|max:1".to_string());
        let pdf = FileFacts::new(10 * 1024, "application/pdf", "a.pdf");
        let err = validator().validate(Some(&pdf), "file", &custom).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnImage { .. }));
    }

    #[test]
    fn test_mimes_uses_detected_type_over_name() {
        // A PNG renamed to .pdf is still a PNG.
        let renamed = FileFacts::new(1024, "image/png", "trick.pdf");
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "mimes:pdf".to_string());
        assert!(validator().validate(Some(&renamed), "file", &custom).is_err());

        // Unrecognised content falls back to the client name.
        let unknown = FileFacts::new(1024, OCTET_STREAM, "notes.md");
        custom.insert("file".to_string(), "mimes:md".to_string());
        assert!(validator().validate(Some(&unknown), "file", &custom).is_ok());
    }

    #[test]
    fn test_jpeg_matches_jpg_and_jpeg() {
        let jpeg = FileFacts::new(1024, "image/jpeg", "a.jpeg");
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "mimes:jpg".to_string());
        assert!(validator().validate(Some(&jpeg), "file", &custom).is_ok());
        custom.insert("file".to_string(), "mimes:jpeg".to_string());
        assert!(validator().validate(Some(&jpeg), "file", &custom).is_ok());
    }

    #[test]
    fn test_mimetypes_wildcard() {
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "mimetypes:image/*,application/pdf".to_string());
        assert!(validator().validate(Some(&png(10)), "file", &custom).is_ok());
        let mp4 = FileFacts::new(10, "video/mp4", "a.mp4");
        assert!(validator().validate(Some(&mp4), "file", &custom).is_err());
    }

    #[test]
    fn test_min_size() {
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "min:2".to_string());
        let err = validator().validate(Some(&png(1024)), "file", &custom).unwrap_err();
        assert_eq!(err.to_string(), "The file field must be at least 2 kilobytes.");
    }

    #[test]
    fn test_invalid_custom_rule_is_input_error() {
        let mut custom = HashMap::new();
        custom.insert("file".to_string(), "required|bogus".to_string());
        let err = validator().validate(Some(&png(10)), "file", &custom).unwrap_err();
        assert!(matches!(
            UploadError::from(err),
            UploadError::InvalidInput(_)
        ));
    }
}
