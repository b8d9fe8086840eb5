use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("cannot allocate a {width}x{height} raster")]
    Allocation { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid record name {0:?}")]
    InvalidId(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Please create a signature first")]
    NothingToSave,
    #[error("Please enter a file name")]
    EmptyLabel,
    #[error("a signature name cannot contain {0:?}")]
    InvalidLabel(char),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SaveError {
    // refused up front; the user fixes the input rather than retrying
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NothingToSave | Self::EmptyLabel | Self::InvalidLabel(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{} is not a readable file", .0.display())]
    Missing(PathBuf),
    #[error("could not open {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("not a readable PNG: {0}")]
    Decode(#[from] image::ImageError),
}
