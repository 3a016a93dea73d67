use crate::error::{LoadError, SourceError};
use futures::future::BoxFuture;
use image::DynamicImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A normalized search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Random,
    Term(String),
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Term(term) => write!(f, "\"{}\"", term),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    Url(String),
    File(PathBuf),
}

impl fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A decoded image plus where it came from. Cloning shares the pixels.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    origin: ImageOrigin,
    image: Arc<DynamicImage>,
}

impl ImageCandidate {
    pub fn new(origin: ImageOrigin, image: DynamicImage) -> Self {
        Self {
            origin,
            image: Arc::new(image),
        }
    }

    pub fn from_url(url: impl Into<String>, image: DynamicImage) -> Self {
        Self::new(ImageOrigin::Url(url.into()), image)
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Same origin and the very same decoded pixels.
    pub fn same_as(&self, other: &ImageCandidate) -> bool {
        self.origin == other.origin && Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Remote image provider.
///
/// `list_urls` errors are swallowed by the caller and count as zero results;
/// `fetch_image` errors drop that one candidate.
pub trait ImageSource: Send + Sync {
    fn list_urls(&self, query: SearchQuery) -> BoxFuture<'_, Result<Vec<String>, SourceError>>;

    fn fetch_image(&self, url: String) -> BoxFuture<'_, Result<DynamicImage, SourceError>>;
}

pub fn load_file(path: &Path) -> Result<ImageCandidate, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Access {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let image = image::load_from_memory(&bytes).map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(ImageCandidate::new(ImageOrigin::File(path.to_path_buf()), image))
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_file_errors() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.png");
        assert!(matches!(load_file(&missing), Err(LoadError::NotFound(_))));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(matches!(load_file(&garbage), Err(LoadError::Decode { .. })));
    }

    #[test]
    fn test_load_file_decodes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        testing::pixel().save(&path).unwrap();

        let candidate = load_file(&path).unwrap();
        assert_eq!(candidate.origin(), &ImageOrigin::File(path));
        assert_eq!(candidate.image().width(), 2);
    }

    #[test]
    fn test_same_as_requires_shared_pixels() {
        let a = ImageCandidate::from_url("u1", testing::pixel());
        let b = ImageCandidate::from_url("u1", testing::pixel());
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }
}
