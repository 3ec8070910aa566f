//! Error types for ray casting.

use thiserror::Error;

/// Errors that can occur while casting a ray through a mesh.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastError {
    /// The ray direction has zero length and cannot be normalized.
    #[error("ray direction has zero length")]
    DegenerateDirection,

    /// A face has a zero-length first edge or flat normal, so crossings
    /// against it cannot be classified.
    #[error("face {face} has a zero-length tangent or normal")]
    DegenerateFace { face: usize },

    /// Backward refinement never recovered the pre-crossing side of a
    /// face plane within the configured bound.
    #[error("refinement failed to recover the pre-crossing side of face {face}")]
    RefinementDiverged { face: usize },
}
