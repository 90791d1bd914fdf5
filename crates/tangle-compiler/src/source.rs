//! The boundary with the optical marker detector.

use tangle_types::Marker;
use thiserror::Error;

/// The detector could not produce a marker set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("marker detection failed: {0}")]
pub struct DetectionError(pub String);

/// Anything that can produce the markers of one photograph.
///
/// Detection may be slow, so the compile worker calls it on a blocking
/// thread.
pub trait MarkerSource {
    fn detect(&self) -> Result<Vec<Marker>, DetectionError>;
}

impl MarkerSource for Vec<Marker> {
    fn detect(&self) -> Result<Vec<Marker>, DetectionError> {
        Ok(self.clone())
    }
}

impl<S: MarkerSource + ?Sized> MarkerSource for Box<S> {
    fn detect(&self) -> Result<Vec<Marker>, DetectionError> {
        (**self).detect()
    }
}
