use crate::error::ParameterError;
use crate::primitive::Dimension;

/// Construction parameters of a [`crate::Tree`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeParameter {
    /// Maximum number of points a leaf holds between operations. An insertion into a
    /// full leaf splits it.
    ///
    /// Merging kicks in once two sibling leaves hold fewer than half of this in total,
    /// therefore capacities below 4 never merge.
    pub bucket_capacity: usize,

    /// Dimension the root leaf orders its bucket by, before the first split happens.
    pub seed_dimension: Dimension,
}

impl Default for TreeParameter {
    fn default() -> Self {
        Self::new(2, 0)
    }
}

impl TreeParameter {
    pub fn new(bucket_capacity: usize, seed_dimension: Dimension) -> Self {
        Self {
            bucket_capacity,
            seed_dimension,
        }
    }

    pub fn with(mut self, visit: impl FnOnce(&mut Self)) -> Self {
        visit(&mut self);
        self
    }

    pub(crate) fn validate(&self, dimensions: usize) -> Result<(), ParameterError> {
        if self.bucket_capacity == 0 {
            return Err(ParameterError::ZeroBucketCapacity);
        }

        if dimensions == 0 {
            return Err(ParameterError::NoDimensions);
        }

        if self.seed_dimension >= dimensions {
            return Err(ParameterError::SeedDimensionOutOfRange {
                seed: self.seed_dimension,
                dimensions,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate() {
        assert_eq!(TreeParameter::default().validate(2), Ok(()));
        assert_eq!(
            TreeParameter::new(0, 0).validate(2),
            Err(ParameterError::ZeroBucketCapacity)
        );
        assert_eq!(
            TreeParameter::default().validate(0),
            Err(ParameterError::NoDimensions)
        );
        assert_eq!(
            TreeParameter::default()
                .with(|x| x.seed_dimension = 3)
                .validate(3),
            Err(ParameterError::SeedDimensionOutOfRange {
                seed: 3,
                dimensions: 3
            })
        );
    }
}
