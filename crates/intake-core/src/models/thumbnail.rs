use serde::{Deserialize, Serialize};

/// A configured thumbnail size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Fill the exact box, cropping overflow, instead of fitting inside it.
    pub crop: bool,
}

impl ThumbnailSize {
    pub fn new(label: impl Into<String>, width: u32, height: u32, crop: bool) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            crop,
        }
    }

    /// Storage path of this size's thumbnail for the file stored at `parent_path`.
    pub fn path_for(&self, parent_path: &str) -> String {
        thumbnail_path(parent_path, &self.label)
    }

    /// Parse `small:100x100,medium:300x300:crop`.
    pub fn parse_list(s: &str) -> Result<Vec<ThumbnailSize>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let mut parts = entry.split(':');
                let label = parts.next().unwrap_or_default().trim();
                let dims = parts
                    .next()
                    .ok_or_else(|| format!("thumbnail size '{}' has no dimensions", entry))?;
                let crop = match parts.next().map(str::trim) {
                    None => false,
                    Some("crop") => true,
                    Some(other) => {
                        return Err(format!("unknown thumbnail flag '{}' in '{}'", other, entry))
                    }
                };
                let (w, h) = dims
                    .trim()
                    .split_once('x')
                    .ok_or_else(|| format!("invalid dimensions '{}', expected WxH", dims))?;
                let width = w
                    .parse::<u32>()
                    .map_err(|_| format!("invalid width '{}'", w))?;
                let height = h
                    .parse::<u32>()
                    .map_err(|_| format!("invalid height '{}'", h))?;
                if label.is_empty() || width == 0 || height == 0 {
                    return Err(format!("invalid thumbnail size '{}'", entry));
                }
                Ok(ThumbnailSize::new(label, width, height, crop))
            })
            .collect()
    }
}

/// `dirname(parent)/thumb_{label}_{basename(parent)}`
pub fn thumbnail_path(parent_path: &str, label: &str) -> String {
    match parent_path.rsplit_once('/') {
        Some((dir, name)) => format!("{}/thumb_{}_{}", dir, label, name),
        None => format!("thumb_{}_{}", label, parent_path),
    }
}
