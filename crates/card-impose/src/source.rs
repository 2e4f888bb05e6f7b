//! Where card images come from
//!
//! Acquisition and upscaling happen elsewhere; by the time a job runs every
//! image reference must resolve to a decoded bitmap.

use crate::types::*;
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves a manifest image reference to a decoded bitmap
pub trait ImageSource: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<DynamicImage>;
}

/// Images stored as files below a root directory
#[derive(Debug, Clone)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ImageSource for FsImageSource {
    fn resolve(&self, reference: &str) -> Result<DynamicImage> {
        let path = self.path_for(reference);
        log::debug!("Loading card image {}", path.display());
        Ok(image::open(&path)?)
    }
}

/// Pre-decoded images keyed by reference, mostly for tests and previews
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, DynamicImage>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, image: DynamicImage) {
        self.images.insert(reference.into(), image);
    }

    pub fn with(mut self, reference: impl Into<String>, image: DynamicImage) -> Self {
        self.insert(reference, image);
        self
    }
}

impl ImageSource for MemoryImageSource {
    fn resolve(&self, reference: &str) -> Result<DynamicImage> {
        self.images.get(reference).cloned().ok_or_else(|| {
            ImposeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No image registered for '{}'", reference),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_memory_source_resolves_registered_images() {
        let source = MemoryImageSource::new().with("a.png", DynamicImage::ImageRgb8(RgbImage::new(4, 6)));
        let img = source.resolve("a.png").unwrap();
        assert_eq!((img.width(), img.height()), (4, 6));
        assert!(source.resolve("b.png").is_err());
    }

    #[test]
    fn test_fs_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(3, 2).save(dir.path().join("c.png")).unwrap();

        let source = FsImageSource::new(dir.path());
        let img = source.resolve("c.png").unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert!(source.resolve("missing.png").is_err());
    }
}
