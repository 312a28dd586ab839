//! MIME detection and extension lookup.
//!
//! Content is identified by magic bytes first because clients and remote servers
//! frequently mis-declare types. Extensions come from a small canonical table, then the
//! `mime_guess` database, then the source name, then `bin`.

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Bytes needed by the magic-byte detector.
pub const SNIFF_LEN: usize = 8192;

const COMMON_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/bmp", "bmp"),
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
    ("video/x-msvideo", "avi"),
    ("video/x-matroska", "mkv"),
    ("video/webm", "webm"),
    ("audio/mpeg", "mp3"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
];

/// Strip parameters and normalize case: `Image/PNG; q=1` -> `image/png`.
pub fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// MIME type recognised from magic bytes, if any.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

/// Sniffed type, else the declared type, else `application/octet-stream`.
pub fn detect(bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(detected) = sniff(bytes) {
        return detected.to_string();
    }
    declared
        .map(essence)
        .filter(|mime| !mime.is_empty())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Lowercased extension of the last path segment of a file name or URL path.
pub fn extension_of(name: &str) -> Option<String> {
    let name = name
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// MIME type guessed from a file name or URL path suffix.
pub fn mime_from_name(name: &str) -> Option<String> {
    let ext = extension_of(name)?;
    mime_guess::from_ext(&ext).first_raw().map(str::to_string)
}

/// All extensions known for a MIME type, canonical one first.
pub fn extensions_for(mime_type: &str) -> Vec<String> {
    let mime = essence(mime_type);
    let mut extensions: Vec<String> = Vec::new();
    if let Some((_, ext)) = COMMON_EXTENSIONS.iter().find(|(m, _)| *m == mime) {
        extensions.push(ext.to_string());
    }
    if let Some(known) = mime_guess::get_mime_extensions_str(&mime) {
        for ext in known {
            if !extensions.iter().any(|e| e == ext) {
                extensions.push(ext.to_string());
            }
        }
    }
    extensions
}

/// Canonical extension for a MIME type, else the extension of `fallback_name`, else `bin`.
pub fn extension_for(mime_type: &str, fallback_name: Option<&str>) -> String {
    extensions_for(mime_type)
        .into_iter()
        .next()
        .or_else(|| fallback_name.and_then(extension_of))
        .unwrap_or_else(|| "bin".to_string())
}
