//! Configuration module
//!
//! A single owned [`Config`] value describes every tunable of the ingestion pipeline:
//! storage disks and path layout, the metadata store toggle, validation rules, image
//! processing, thumbnails, quotas, remote downloads and chunked uploads.
//!
//! `Config::default()` carries the stock settings. `Config::from_env()` applies
//! `FILE_UPLOAD_*` environment overrides on top of them.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::models::ThumbnailSize;
use crate::storage_types::StorageBackend;
use crate::validation::{parse_field_rules, RuleConstraint, ValidationRule};

const MIB: u64 = 1024 * 1024;

const DEFAULT_DISK: &str = "local";
const DEFAULT_BASE_PATH: &str = "uploads";
const DB_MAX_CONNECTIONS: u32 = 20;
const RESIZE_WIDTH: u32 = 800;
const RESIZE_HEIGHT: u32 = 600;
const IMAGE_QUALITY: u8 = 90;
const QUOTA_MAX_BYTES: u64 = 100 * MIB;
const URL_CHUNK_SIZE: u64 = 5 * MIB;
const URL_TIMEOUT_SECS: u64 = 300;
const URL_MAX_SIZE: u64 = 500 * MIB;
const CHUNK_SESSION_TTL_SECS: u64 = 3600;
const MAX_CHUNKS: u32 = 10_000;

/// Folder organisation policy applied once when an upload path is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrganizeBy {
    /// Append `YYYY/MM/DD`.
    #[default]
    Date,
    /// Append `user_{id}`, or `guest` for anonymous uploads.
    User,
    None,
}

impl FromStr for OrganizeBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(OrganizeBy::Date),
            "user" => Ok(OrganizeBy::User),
            "none" | "" => Ok(OrganizeBy::None),
            other => Err(anyhow::anyhow!(
                "Invalid organize_by '{}'. Must be 'date', 'user' or 'none'",
                other
            )),
        }
    }
}

/// A named blob storage target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskConfig {
    Local {
        root: PathBuf,
        base_url: String,
    },
    S3 {
        bucket: String,
        region: String,
        /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
        endpoint: Option<String>,
    },
}

impl DiskConfig {
    pub fn backend(&self) -> StorageBackend {
        match self {
            DiskConfig::Local { .. } => StorageBackend::Local,
            DiskConfig::S3 { .. } => StorageBackend::S3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdnConfig {
    pub enabled: bool,
    pub url: String,
}

impl CdnConfig {
    /// CDN base URL when the CDN is enabled and configured.
    pub fn base_url(&self) -> Option<&str> {
        if self.enabled && !self.url.trim().is_empty() {
            Some(self.url.trim_end_matches('/'))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Name of the default disk in `disks`.
    pub disk: String,
    /// Base path every upload is stored under.
    pub path: String,
    pub default_folder: String,
    pub organize_by: OrganizeBy,
    pub cdn: CdnConfig,
    pub disks: BTreeMap<String, DiskConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Validation rules by top-level MIME category, with per-field overrides.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub image: ValidationRule,
    pub video: ValidationRule,
    pub audio: Option<ValidationRule>,
    pub document: ValidationRule,
    /// Fallback for anything without a category rule.
    pub other: ValidationRule,
    pub custom_fields: HashMap<String, ValidationRule>,
}

impl ValidationConfig {
    /// Configured rule for a category key as returned by `FileCategory::rule_key`.
    pub fn for_category(&self, key: &str) -> Option<&ValidationRule> {
        match key {
            "image" => Some(&self.image),
            "video" => Some(&self.video),
            "audio" => self.audio.as_ref(),
            "document" => Some(&self.document),
            _ => None,
        }
    }
}

/// Anchor of a watermark on the nine-point compass grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkPosition {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    #[default]
    BottomRight,
}

impl FromStr for WatermarkPosition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "top-left" => Ok(WatermarkPosition::TopLeft),
            "top" | "top-center" => Ok(WatermarkPosition::Top),
            "top-right" => Ok(WatermarkPosition::TopRight),
            "left" | "center-left" => Ok(WatermarkPosition::Left),
            "center" => Ok(WatermarkPosition::Center),
            "right" | "center-right" => Ok(WatermarkPosition::Right),
            "bottom-left" => Ok(WatermarkPosition::BottomLeft),
            "bottom" | "bottom-center" => Ok(WatermarkPosition::Bottom),
            "bottom-right" => Ok(WatermarkPosition::BottomRight),
            other => Err(anyhow::anyhow!("Invalid watermark position '{}'", other)),
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WatermarkPosition::TopLeft => "top-left",
            WatermarkPosition::Top => "top",
            WatermarkPosition::TopRight => "top-right",
            WatermarkPosition::Left => "left",
            WatermarkPosition::Center => "center",
            WatermarkPosition::Right => "right",
            WatermarkPosition::BottomLeft => "bottom-left",
            WatermarkPosition::Bottom => "bottom",
            WatermarkPosition::BottomRight => "bottom-right",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect_ratio: bool,
    /// Allow enlarging images smaller than the target.
    pub upsize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSettings {
    /// Watermark image on disk. No path means no watermark.
    pub path: Option<PathBuf>,
    pub position: WatermarkPosition,
    pub offset_x: u32,
    pub offset_y: u32,
    /// 0 to 100
    pub opacity: u8,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            path: None,
            position: WatermarkPosition::BottomRight,
            offset_x: 10,
            offset_y: 10,
            opacity: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageProcessingConfig {
    pub enabled: bool,
    pub resize: Option<ResizeConfig>,
    pub watermark: WatermarkSettings,
    /// Ordered filter name to parameter pairs.
    pub filters: Vec<(String, String)>,
    pub convert_to: Option<String>,
    /// 0 to 100
    pub quality: u8,
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub image: ImageProcessingConfig,
}

#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub enabled: bool,
    pub sizes: Vec<ThumbnailSize>,
}

#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub enabled: bool,
    pub max_size_per_user: u64,
}

#[derive(Debug, Clone)]
pub struct UrlDownloadConfig {
    /// Use `Range` requests instead of a single GET.
    pub chunked: bool,
    pub chunk_size: u64,
    /// Timeout of each individual request.
    pub timeout_secs: u64,
    pub max_size: u64,
    /// MIME family to accepted subtypes. An empty subtype list accepts the whole family;
    /// an empty map accepts everything.
    pub allowed_mime_types: BTreeMap<String, Vec<String>>,
    /// Host allow-list. `None` allows every host.
    pub allowed_hosts: Option<Vec<String>>,
}

impl UrlDownloadConfig {
    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        if self.allowed_mime_types.is_empty() {
            return true;
        }
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let Some((family, subtype)) = mime.split_once('/') else {
            return false;
        };
        match self.allowed_mime_types.get(family) {
            Some(subtypes) => subtypes.is_empty() || subtypes.iter().any(|s| s == subtype),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkUploadConfig {
    /// Idle sessions older than this are purged.
    pub session_ttl_secs: u64,
    /// Parent directory for session spool files. Defaults to the system temp dir.
    pub temp_dir: Option<PathBuf>,
    pub max_chunks: u32,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub validation: ValidationConfig,
    pub processing: ProcessingConfig,
    pub thumbnails: ThumbnailConfig,
    pub quota: QuotaConfig,
    pub url_download: UrlDownloadConfig,
    pub chunk_upload: ChunkUploadConfig,
}

fn mimes(list: &[&str]) -> RuleConstraint {
    RuleConstraint::Mimes(list.iter().map(|s| s.to_string()).collect())
}

fn default_allowed_mime_types() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    map.insert("image".to_string(), Vec::new());
    map.insert("video".to_string(), Vec::new());
    map.insert("audio".to_string(), Vec::new());
    map.insert(
        "application".to_string(),
        [
            "pdf",
            "msword",
            "vnd.openxmlformats-officedocument.wordprocessingml.document",
            "vnd.ms-excel",
            "vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    );
    map.insert(
        "text".to_string(),
        vec!["plain".to_string(), "csv".to_string()],
    );
    map
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size_per_user: QUOTA_MAX_BYTES,
        }
    }
}

impl Default for UrlDownloadConfig {
    fn default() -> Self {
        Self {
            chunked: true,
            chunk_size: URL_CHUNK_SIZE,
            timeout_secs: URL_TIMEOUT_SECS,
            max_size: URL_MAX_SIZE,
            allowed_mime_types: default_allowed_mime_types(),
            allowed_hosts: None,
        }
    }
}

impl Default for ChunkUploadConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: CHUNK_SESSION_TTL_SECS,
            temp_dir: None,
            max_chunks: MAX_CHUNKS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut disks = BTreeMap::new();
        disks.insert(
            DEFAULT_DISK.to_string(),
            DiskConfig::Local {
                root: PathBuf::from("storage"),
                base_url: "/storage".to_string(),
            },
        );

        Self {
            storage: StorageConfig {
                disk: DEFAULT_DISK.to_string(),
                path: DEFAULT_BASE_PATH.to_string(),
                default_folder: String::new(),
                organize_by: OrganizeBy::Date,
                cdn: CdnConfig::default(),
                disks,
            },
            database: DatabaseConfig {
                enabled: false,
                url: None,
                max_connections: DB_MAX_CONNECTIONS,
            },
            validation: ValidationConfig {
                image: ValidationRule::new(vec![
                    RuleConstraint::Required,
                    RuleConstraint::Image,
                    mimes(&["jpeg", "png", "jpg", "gif", "webp", "avif"]),
                    RuleConstraint::Max(2048),
                ]),
                video: ValidationRule::new(vec![
                    RuleConstraint::Required,
                    mimes(&["mp4", "mov", "avi", "wmv"]),
                    RuleConstraint::Max(20480),
                ]),
                audio: None,
                document: ValidationRule::new(vec![
                    RuleConstraint::Required,
                    mimes(&["pdf", "doc", "docx", "xls", "xlsx"]),
                    RuleConstraint::Max(10240),
                ]),
                other: ValidationRule::new(vec![
                    RuleConstraint::Required,
                    RuleConstraint::Max(20480),
                ]),
                custom_fields: HashMap::new(),
            },
            processing: ProcessingConfig {
                image: ImageProcessingConfig {
                    enabled: true,
                    resize: Some(ResizeConfig {
                        width: Some(RESIZE_WIDTH),
                        height: Some(RESIZE_HEIGHT),
                        maintain_aspect_ratio: true,
                        upsize: false,
                    }),
                    watermark: WatermarkSettings::default(),
                    filters: Vec::new(),
                    convert_to: None,
                    quality: IMAGE_QUALITY,
                },
            },
            thumbnails: ThumbnailConfig {
                enabled: true,
                sizes: vec![
                    ThumbnailSize::new("small", 100, 100, false),
                    ThumbnailSize::new("medium", 300, 300, false),
                ],
            },
            quota: QuotaConfig::default(),
            url_download: UrlDownloadConfig::default(),
            chunk_upload: ChunkUploadConfig::default(),
        }
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| parse_bool(&v, default))
        .unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_rule(key: &str) -> Result<Option<ValidationRule>, anyhow::Error> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .parse::<ValidationRule>()
            .map(Some)
            .with_context(|| format!("{} is not a valid validation rule", key)),
        _ => Ok(None),
    }
}

/// Parse `greyscale:0,blur:1.5` into ordered name/parameter pairs.
pub fn parse_filters(s: &str) -> Vec<(String, String)> {
    s.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, value)) => (name.trim().to_lowercase(), value.trim().to_string()),
            None => (entry.to_lowercase(), String::new()),
        })
        .collect()
}

/// Parse `image/*,video/mp4` into a family to subtypes map.
pub fn parse_mime_allow_list(s: &str) -> Result<BTreeMap<String, Vec<String>>, anyhow::Error> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let entry = entry.to_lowercase();
        let (family, subtype) = match entry.split_once('/') {
            Some((family, subtype)) => (family.to_string(), subtype.to_string()),
            None => (entry.clone(), "*".to_string()),
        };
        if family.is_empty() || subtype.is_empty() {
            return Err(anyhow::anyhow!("Invalid MIME allow-list entry '{}'", entry));
        }
        let subtypes = map.entry(family).or_default();
        if subtype == "*" {
            subtypes.clear();
            subtypes.push("*".to_string());
        } else if !subtypes.iter().any(|s| s == "*") {
            subtypes.push(subtype);
        }
    }
    for subtypes in map.values_mut() {
        if subtypes.iter().any(|s| s == "*") {
            subtypes.clear();
        }
    }
    Ok(map)
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from `FILE_UPLOAD_*` (and storage/database) environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let mut config = Config::default();

        // Storage
        let storage = &mut config.storage;
        storage.disk = env::var("FILE_UPLOAD_DISK").unwrap_or_else(|_| DEFAULT_DISK.to_string());
        storage.path =
            env::var("FILE_UPLOAD_PATH").unwrap_or_else(|_| DEFAULT_BASE_PATH.to_string());
        storage.default_folder = env::var("FILE_UPLOAD_DEFAULT_FOLDER").unwrap_or_default();
        if let Ok(organize_by) = env::var("FILE_UPLOAD_ORGANIZE_BY") {
            storage.organize_by = organize_by.parse()?;
        }
        storage.cdn = CdnConfig {
            enabled: env_bool("FILE_UPLOAD_CDN_ENABLED", false),
            url: env::var("FILE_UPLOAD_CDN_URL").unwrap_or_default(),
        };
        if let Ok(root) = env::var("LOCAL_STORAGE_PATH") {
            storage.disks.insert(
                "local".to_string(),
                DiskConfig::Local {
                    root: PathBuf::from(root),
                    base_url: env::var("LOCAL_STORAGE_BASE_URL")
                        .unwrap_or_else(|_| "/storage".to_string()),
                },
            );
        }
        if let Ok(bucket) = env::var("S3_BUCKET") {
            let region = env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "us-east-1".to_string());
            storage.disks.insert(
                "s3".to_string(),
                DiskConfig::S3 {
                    bucket,
                    region,
                    endpoint: env::var("S3_ENDPOINT").ok(),
                },
            );
        }

        // Database
        config.database = DatabaseConfig {
            enabled: env_bool("FILE_UPLOAD_DB_ENABLED", false),
            url: env::var("DATABASE_URL").ok(),
            max_connections: env_parse("DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS),
        };

        // Validation
        let validation = &mut config.validation;
        if let Some(rule) = env_rule("FILE_UPLOAD_RULE_IMAGE")? {
            validation.image = rule;
        }
        if let Some(rule) = env_rule("FILE_UPLOAD_RULE_VIDEO")? {
            validation.video = rule;
        }
        if let Some(rule) = env_rule("FILE_UPLOAD_RULE_AUDIO")? {
            validation.audio = Some(rule);
        }
        if let Some(rule) = env_rule("FILE_UPLOAD_RULE_DOCUMENT")? {
            validation.document = rule;
        }
        if let Some(rule) = env_rule("FILE_UPLOAD_RULE_OTHER")? {
            validation.other = rule;
        }
        if let Ok(raw) = env::var("FILE_UPLOAD_FIELD_RULES") {
            validation.custom_fields = parse_field_rules(&raw)
                .context("FILE_UPLOAD_FIELD_RULES is invalid")?
                .into_iter()
                .collect();
        }

        // Image processing
        let image = &mut config.processing.image;
        image.enabled = env_bool("FILE_UPLOAD_IMAGE_PROCESSING", true);
        let width = env_parse("FILE_UPLOAD_RESIZE_WIDTH", RESIZE_WIDTH);
        let height = env_parse("FILE_UPLOAD_RESIZE_HEIGHT", RESIZE_HEIGHT);
        image.resize = if width == 0 && height == 0 {
            None
        } else {
            Some(ResizeConfig {
                width: (width > 0).then_some(width),
                height: (height > 0).then_some(height),
                maintain_aspect_ratio: env_bool("FILE_UPLOAD_RESIZE_KEEP_ASPECT", true),
                upsize: env_bool("FILE_UPLOAD_RESIZE_UPSIZE", false),
            })
        };
        image.watermark.path = env::var("FILE_UPLOAD_WATERMARK_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Ok(position) = env::var("FILE_UPLOAD_WATERMARK_POSITION") {
            image.watermark.position = position.parse()?;
        }
        image.watermark.offset_x = env_parse("FILE_UPLOAD_WATERMARK_OFFSET_X", 10);
        image.watermark.offset_y = env_parse("FILE_UPLOAD_WATERMARK_OFFSET_Y", 10);
        image.watermark.opacity = env_parse("FILE_UPLOAD_WATERMARK_OPACITY", 100);
        image.filters = env::var("FILE_UPLOAD_FILTERS")
            .map(|raw| parse_filters(&raw))
            .unwrap_or_default();
        image.convert_to = env::var("FILE_UPLOAD_CONVERT_TO")
            .ok()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());
        image.quality = env_parse("FILE_UPLOAD_QUALITY", IMAGE_QUALITY);

        // Thumbnails
        config.thumbnails.enabled = env_bool("FILE_UPLOAD_THUMBNAILS", true);
        if let Ok(raw) = env::var("FILE_UPLOAD_THUMBNAIL_SIZES") {
            config.thumbnails.sizes =
                ThumbnailSize::parse_list(&raw).map_err(|e| anyhow::anyhow!(e))?;
        }

        // Quota
        config.quota = QuotaConfig {
            enabled: env_bool("FILE_UPLOAD_QUOTA_ENABLED", false),
            max_size_per_user: env_parse("FILE_UPLOAD_QUOTA_BYTES", QUOTA_MAX_BYTES),
        };

        // Remote downloads
        let url = &mut config.url_download;
        url.chunked = env_bool("FILE_UPLOAD_URL_CHUNKED", true);
        url.chunk_size = env_parse("FILE_UPLOAD_URL_CHUNK_SIZE", URL_CHUNK_SIZE);
        url.timeout_secs = env_parse("FILE_UPLOAD_URL_TIMEOUT_SECS", URL_TIMEOUT_SECS);
        url.max_size = env_parse("FILE_UPLOAD_URL_MAX_SIZE", URL_MAX_SIZE);
        if let Ok(raw) = env::var("FILE_UPLOAD_URL_ALLOWED_TYPES") {
            url.allowed_mime_types = parse_mime_allow_list(&raw)?;
        }
        url.allowed_hosts = env::var("FILE_UPLOAD_URL_ALLOWED_HOSTS")
            .ok()
            .map(|raw| parse_list(&raw))
            .filter(|hosts| !hosts.is_empty());

        // Chunked uploads
        config.chunk_upload = ChunkUploadConfig {
            session_ttl_secs: env_parse("FILE_UPLOAD_CHUNK_TTL_SECS", CHUNK_SESSION_TTL_SECS),
            temp_dir: env::var("FILE_UPLOAD_CHUNK_TEMP_DIR").ok().map(PathBuf::from),
            max_chunks: env_parse("FILE_UPLOAD_MAX_CHUNKS", MAX_CHUNKS),
        };

        Ok(config)
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.storage.disks.contains_key(&self.storage.disk) {
            return Err(anyhow::anyhow!(
                "Default disk '{}' is not configured",
                self.storage.disk
            ));
        }

        for (name, disk) in &self.storage.disks {
            if let DiskConfig::S3 { bucket, .. } = disk {
                if bucket.trim().is_empty() {
                    return Err(anyhow::anyhow!("Disk '{}' has an empty S3 bucket", name));
                }
            }
        }

        if self.database.enabled && self.database.url.is_none() {
            return Err(anyhow::anyhow!(
                "FILE_UPLOAD_DB_ENABLED=true requires DATABASE_URL to be set"
            ));
        }

        let image = &self.processing.image;
        if image.quality > 100 {
            return Err(anyhow::anyhow!(
                "Image quality must be between 0 and 100, got {}",
                image.quality
            ));
        }
        if image.watermark.opacity > 100 {
            return Err(anyhow::anyhow!(
                "Watermark opacity must be between 0 and 100, got {}",
                image.watermark.opacity
            ));
        }

        if self.url_download.chunk_size == 0 {
            return Err(anyhow::anyhow!("URL download chunk size must be positive"));
        }
        if self.url_download.timeout_secs == 0 {
            return Err(anyhow::anyhow!("URL download timeout must be positive"));
        }
        if self.chunk_upload.max_chunks == 0 {
            return Err(anyhow::anyhow!("Maximum chunk count must be positive"));
        }

        if self.quota.enabled && !self.database.enabled {
            tracing::warn!("Quota is enabled but the metadata store is disabled; quota checks will be skipped");
        }

        Ok(())
    }
}
