//! Storage path generation.

use chrono::{DateTime, Utc};
use intake_core::config::OrganizeBy;
use intake_core::UploadError;

/// Directory an upload is stored under: base path, then folder, then the organisation
/// segment. The result is computed once per upload and stored with the record.
pub fn generate_directory(
    base_path: &str,
    folder: Option<&str>,
    organize_by: OrganizeBy,
    user_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<String, UploadError> {
    let organized = match organize_by {
        OrganizeBy::Date => now.format("%Y/%m/%d").to_string(),
        OrganizeBy::User => match user_id {
            Some(id) => format!("user_{}", id),
            None => "guest".to_string(),
        },
        OrganizeBy::None => String::new(),
    };

    let mut segments = Vec::new();
    for part in [base_path, folder.unwrap_or_default(), organized.as_str()] {
        for segment in part.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(UploadError::InvalidInput(format!(
                    "Invalid path segment '{}'",
                    segment
                )));
            }
            segments.push(segment);
        }
    }
    Ok(segments.join("/"))
}

/// `directory/name`, or `name` alone at the root.
pub fn join(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", directory, name)
    }
}

/// Public URL under a base URL.
pub fn public_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
