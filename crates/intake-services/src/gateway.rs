//! Save pipeline: detect, validate, check quota, transform, persist, derive thumbnails,
//! record metadata.
//!
//! Blob writes happen before the metadata record. A failed blob write deletes whatever
//! part of the blob landed, and a failed record write deletes the blob and thumbnails
//! that were already written before the error is returned.

use crate::paths;
use crate::quota::QuotaEnforcer;
use crate::source::FilePayload;
use bytes::Bytes;
use chrono::Utc;
use intake_core::models::{ThumbnailArtifact, UploadOptions, UploadResult};
use intake_core::{Config, FileCategory, NewStoredFile, ThumbnailSize, UploadError};
use intake_db::FileRepository;
use intake_processing::{mime, FileFacts, FileValidator};
use intake_storage::{Disks, Storage};
use std::sync::Arc;

/// Content after the optional image transform.
struct Prepared {
    bytes: Option<Bytes>,
    mime_type: String,
    extension: String,
}

pub(crate) struct Gateway {
    pub(crate) config: Arc<Config>,
    pub(crate) disks: Disks,
    pub(crate) repository: Option<Arc<dyn FileRepository>>,
    validator: FileValidator,
    quota: QuotaEnforcer,
}

impl Gateway {
    pub(crate) fn new(
        config: Arc<Config>,
        disks: Disks,
        repository: Option<Arc<dyn FileRepository>>,
    ) -> Self {
        let validator = FileValidator::new(config.validation.clone());
        let quota = QuotaEnforcer::new(config.quota.clone(), repository.clone());
        Self {
            config,
            disks,
            repository,
            validator,
            quota,
        }
    }

    pub(crate) fn validator(&self) -> &FileValidator {
        &self.validator
    }

    /// Public URL of a stored path, through the CDN when one is configured.
    pub(crate) fn public_url(&self, storage: &dyn Storage, path: &str) -> String {
        match self.config.storage.cdn.base_url() {
            Some(cdn) => paths::public_url(cdn, path),
            None => storage.url(path),
        }
    }

    #[tracing::instrument(
        skip(self, payload, field, options),
        fields(field_name = %field, user_id = ?options.user_id, disk = ?options.disk, path)
    )]
    pub(crate) async fn save(
        &self,
        payload: FilePayload,
        field: &str,
        options: &UploadOptions,
    ) -> Result<UploadResult, UploadError> {
        let start = std::time::Instant::now();
        let (disk_name, storage) = self.disks.get(options.disk.as_deref())?;
        let disk_name = disk_name.to_string();

        let folder = options
            .folder_name
            .as_deref()
            .or(Some(self.config.storage.default_folder.as_str()));
        let directory = paths::generate_directory(
            &self.config.storage.path,
            folder,
            self.config.storage.organize_by,
            options.user_id,
            Utc::now(),
        )?;

        let size = payload.len().await?;
        let head = payload.head(mime::SNIFF_LEN).await?;
        let declared = payload
            .content_type
            .clone()
            .or_else(|| mime::mime_from_name(&payload.original_name));
        let mime_type = mime::detect(&head, declared.as_deref());

        let facts = FileFacts::new(size, mime_type.clone(), payload.original_name.clone());
        self.validator
            .validate(Some(&facts), field, &options.custom_rules)?;

        self.quota.check(options.user_id, size).await?;

        let category = FileCategory::from_mime(&mime_type);
        let prepared = if category == FileCategory::Image {
            let original = payload.read_all().await?;
            self.prepare_image(original, &mime_type, &payload.original_name, options)
                .await
        } else {
            Prepared {
                bytes: None,
                extension: mime::extension_for(&mime_type, Some(&payload.original_name)),
                mime_type,
            }
        };

        let name = format!("{}.{}", uuid::Uuid::new_v4(), prepared.extension);
        let path = paths::join(&directory, &name);
        tracing::Span::current().record("path", path.as_str());

        let written = match prepared.bytes {
            Some(bytes) => {
                let len = bytes.len() as u64;
                storage
                    .put(&path, bytes.clone())
                    .await
                    .map(|()| (len, Some(bytes)))
            }
            None => {
                let reader = payload.reader().await?;
                storage.put_stream(&path, reader).await.map(|n| (n, None))
            }
        };
        let (stored_size, stored_bytes) = match written {
            Ok(written) => written,
            Err(e) => {
                tracing::error!(error = %e, "Blob write failed");
                self.rollback(storage.as_ref(), &path, &[]).await;
                return Err(e.into());
            }
        };

        let thumbnails = match &stored_bytes {
            Some(bytes) if FileCategory::from_mime(&prepared.mime_type) == FileCategory::Image => {
                self.write_thumbnails(storage.as_ref(), &path, bytes, options)
                    .await
            }
            _ => Vec::new(),
        };

        let record = match &self.repository {
            Some(repository) => {
                let created = repository
                    .create(NewStoredFile {
                        name: name.clone(),
                        path: path.clone(),
                        disk: disk_name.clone(),
                        mime_type: prepared.mime_type.clone(),
                        size: stored_size as i64,
                        user_id: options.user_id,
                    })
                    .await;
                match created {
                    Ok(record) => Some(record),
                    Err(e) => {
                        self.rollback(storage.as_ref(), &path, &thumbnails).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let url = self.public_url(storage.as_ref(), &path);
        let thumbnails = thumbnails
            .into_iter()
            .map(|(size, thumb_path)| ThumbnailArtifact {
                url: self.public_url(storage.as_ref(), &thumb_path),
                label: size.label,
                path: thumb_path,
                width: size.width,
                height: size.height,
                crop: size.crop,
            })
            .collect();

        tracing::info!(
            size_bytes = stored_size,
            mime_type = %prepared.mime_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File stored"
        );

        Ok(UploadResult {
            id: record.as_ref().map(|r| r.id),
            name,
            original_name: payload.original_name.clone(),
            path,
            disk: disk_name,
            url,
            thumbnails,
            category: FileCategory::from_mime(&prepared.mime_type),
            mime_type: prepared.mime_type,
            size: stored_size,
            user_id: options.user_id,
            created_at: record.map(|r| r.created_at).unwrap_or_else(Utc::now),
        })
    }

    /// Best-effort removal of artifacts written before a failed write.
    async fn rollback(
        &self,
        storage: &dyn Storage,
        path: &str,
        thumbnails: &[(ThumbnailSize, String)],
    ) {
        let targets = std::iter::once(path).chain(thumbnails.iter().map(|(_, p)| p.as_str()));
        for target in targets {
            if let Err(e) = storage.delete(target).await {
                tracing::error!(path = %target, error = %e, "Rollback failed to delete blob");
            }
        }
        tracing::warn!(path = %path, "Rolled back stored blob");
    }

    /// Transform an image. Failures keep the original bytes.
    #[cfg(feature = "image")]
    async fn prepare_image(
        &self,
        original: Bytes,
        mime_type: &str,
        original_name: &str,
        options: &UploadOptions,
    ) -> Prepared {
        use intake_processing::{ImageTransformer, TransformOverrides};

        let untouched = |original: Bytes| Prepared {
            bytes: Some(original),
            mime_type: mime_type.to_string(),
            extension: mime::extension_for(mime_type, Some(original_name)),
        };

        let image_config = self.config.processing.image.clone();
        if !image_config.enabled {
            return untouched(original);
        }

        let watermark = match &image_config.watermark.path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Watermark image unavailable, skipping watermark");
                    None
                }
            },
            None => None,
        };

        let overrides = TransformOverrides {
            convert_to: options.convert_to.clone(),
            quality: options.quality,
            resize: options.resize,
        };
        let data = original.clone();
        let result = tokio::task::spawn_blocking(move || {
            ImageTransformer::process(&data, &image_config, &overrides, watermark.as_deref())
        })
        .await;

        match result {
            Ok(Ok(transformed)) => Prepared {
                mime_type: transformed.mime_type().to_string(),
                extension: transformed.extension().to_string(),
                bytes: Some(transformed.bytes),
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Image processing failed, storing original");
                untouched(original)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image processing task failed, storing original");
                untouched(original)
            }
        }
    }

    #[cfg(not(feature = "image"))]
    async fn prepare_image(
        &self,
        original: Bytes,
        mime_type: &str,
        original_name: &str,
        _options: &UploadOptions,
    ) -> Prepared {
        Prepared {
            bytes: Some(original),
            mime_type: mime_type.to_string(),
            extension: mime::extension_for(mime_type, Some(original_name)),
        }
    }

    /// Write every configured thumbnail of the image stored at `parent_path`.
    /// Returns the size and path of each thumbnail that was written.
    #[cfg(feature = "image")]
    async fn write_thumbnails(
        &self,
        storage: &dyn Storage,
        parent_path: &str,
        bytes: &Bytes,
        options: &UploadOptions,
    ) -> Vec<(ThumbnailSize, String)> {
        use intake_processing::ThumbnailGenerator;

        let thumbnails = &self.config.thumbnails;
        if !thumbnails.enabled || thumbnails.sizes.is_empty() {
            return Vec::new();
        }

        let data = bytes.clone();
        let sizes = thumbnails.sizes.clone();
        let quality = options.quality.unwrap_or(self.config.processing.image.quality);
        let rendered = tokio::task::spawn_blocking(move || {
            ThumbnailGenerator::generate(&data, &sizes, None, quality)
        })
        .await;

        let rendered = match rendered {
            Ok(Ok(rendered)) => rendered,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Thumbnail source could not be decoded");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Thumbnail task failed");
                return Vec::new();
            }
        };

        let mut written = Vec::with_capacity(rendered.len());
        for (size, result) in rendered {
            let thumb_path = size.path_for(parent_path);
            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(label = %size.label, error = %e, "Thumbnail skipped");
                    continue;
                }
            };
            match storage.put(&thumb_path, bytes).await {
                Ok(()) => written.push((size, thumb_path)),
                Err(e) => {
                    tracing::warn!(label = %size.label, path = %thumb_path, error = %e, "Thumbnail write failed");
                }
            }
        }
        written
    }

    #[cfg(not(feature = "image"))]
    async fn write_thumbnails(
        &self,
        _storage: &dyn Storage,
        _parent_path: &str,
        _bytes: &Bytes,
        _options: &UploadOptions,
    ) -> Vec<(ThumbnailSize, String)> {
        Vec::new()
    }
}
