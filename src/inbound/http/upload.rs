//! Multipart forms carrying an `image` file next to text fields.

use std::{collections::HashMap, sync::Arc};

use axum::extract::Multipart;
use tracing::warn;

use crate::{domain::ImageRef, ports::storage::FileStoragePort};

use super::error::ApiError;

const IMAGE_FIELD: &str = "image";

pub struct Upload {
    content_type: String,
    bytes: Vec<u8>,
}

impl Upload {
    /// Hand the image over to storage
    ///
    /// From here on the caller owns the stored file and must discard it if the request fails.
    pub async fn store(self, files: Arc<dyn FileStoragePort>) -> Result<ImageRef, ApiError> {
        let Upload {
            content_type,
            bytes,
        } = self;
        Ok(files.store(&content_type, bytes).await?)
    }
}

pub struct UploadForm {
    fields: HashMap<String, String>,
    image: Option<Upload>,
}

impl UploadForm {
    /// Drain the multipart body
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        let mut image = None;

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == IMAGE_FIELD {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                image = Some(Upload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                fields.insert(name, field.text().await?);
            }
        }

        Ok(Self { fields, image })
    }

    /// Text field value, empty when absent
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    /// The `image` file, which every form here requires
    pub fn take_image(&mut self) -> Result<Upload, ApiError> {
        self.image.take().ok_or_else(ApiError::invalid_input)
    }
}

/// Remove an upload whose request failed
pub async fn discard(files: Arc<dyn FileStoragePort>, image: ImageRef) {
    if let Err(err) = files.remove(&image).await {
        warn!(error = %err, image = %image, "could not remove upload of failed request");
    }
}
