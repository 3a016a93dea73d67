use std::path::PathBuf;
use thiserror::Error;

/// Failures while listing or fetching remote images.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} is not a decodable image: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("decoder task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Failures while opening a user supplied local file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("cannot read {path:?}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} is not a decodable image: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failures while persisting a wallpaper to the system.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to encode wallpaper to {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("wallpaper i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("system rejected wallpaper: {0}")]
    Os(String),

    #[error("wallpaper command timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("no display surface available")]
    NoSurfaces,

    #[error("monitor enumeration failed: {0}")]
    Ipc(#[from] anyhow::Error),
}
