//! Uploaded images on the local filesystem.
//!
//! Every file lands directly in the upload directory as `{uuid}.{ext}`. The reference recorded
//! on users and places is `uploads/images/{uuid}.{ext}` wherever that directory lives, the path
//! the HTTP layer serves uploads under.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::ImageRef,
    ports::storage::{Error, FileStoragePort},
};

/// Prefix of every recorded image reference
pub const PUBLIC_PREFIX: &str = "uploads/images";

/// Accepted upload media types and the extension they are stored with
const MIME_EXTENSIONS: [(&str, &str); 3] = [
    ("image/png", "png"),
    ("image/jpg", "jpg"),
    ("image/jpeg", "jpeg"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type.trim()))
        .map(|(_, ext)| *ext)
}

#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Use `root` as upload directory, creating it when missing
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, io::Error> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a reference back to a file directly inside the upload directory
    fn resolve(&self, image: &ImageRef) -> Result<PathBuf, Error> {
        let name = image
            .as_str()
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| Error::OutsideStorage(image.to_string()))?;

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.root.join(file)),
            _ => Err(Error::OutsideStorage(image.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl FileStoragePort for LocalFileStorage {
    async fn store(&self, content_type: &str, bytes: Vec<u8>) -> Result<ImageRef, Error> {
        let ext = extension_for(content_type)
            .ok_or_else(|| Error::UnsupportedMediaType(content_type.to_string()))?;
        let name = format!("{}.{ext}", Uuid::new_v4());
        let path = self.root.join(&name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| Error::Adapter(Box::new(err)))?;

        debug!(path = %path.display(), "stored upload");
        Ok(ImageRef::new(format!("{PUBLIC_PREFIX}/{name}")))
    }

    async fn remove(&self, image: &ImageRef) -> Result<(), Error> {
        let path = self.resolve(image)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Adapter(Box::new(err))),
        }
    }
}
