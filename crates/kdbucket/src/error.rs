use crate::primitive::Dimension;

/// The accessor could not resolve a dimension for a point. This is always a usage error:
/// the point type does not declare as many dimensions as the tree walks through.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("dimension {dimension} is not declared by the point type")]
pub struct DimensionNotFound {
    pub dimension: Dimension,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteError {
    /// The leaf the point routes to does not hold it. The tree is left untouched.
    #[error("data entry not found")]
    NotFound,

    #[error(transparent)]
    DimensionNotFound(#[from] DimensionNotFound),
}

/// Rejected construction parameters.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    #[error("bucket capacity must be at least 1")]
    ZeroBucketCapacity,

    #[error("accessor declares no dimensions")]
    NoDimensions,

    #[error("seed dimension {seed} is out of range for {dimensions} dimensions")]
    SeedDimensionOutOfRange { seed: Dimension, dimensions: usize },
}
