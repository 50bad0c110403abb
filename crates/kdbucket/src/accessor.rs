use std::fmt;
use std::marker::PhantomData;

use crate::error::DimensionNotFound;
use crate::primitive::{Dimension, Number};

/// Resolves the value of a point along one dimension.
///
/// The tree consults the accessor on every comparison, sort and split; values are never
/// cached, so implementations MUST be pure. Returning different values for the same point
/// between calls corrupts the tree ordering.
pub trait Accessor<P: ?Sized> {
    type Num: Number;

    /// Number of dimensions the tree cycles through. Must be non-zero.
    fn dimensions(&self) -> usize;

    fn value(&self, point: &P, dimension: Dimension) -> Result<Self::Num, DimensionNotFound>;
}

/// A point type which knows its own dimensions.
pub trait Point {
    type Num: Number;
    const DIMENSIONS: usize;

    fn get(&self, dimension: Dimension) -> Option<Self::Num>;
}

impl<N: Number, const D: usize> Point for [N; D] {
    type Num = N;
    const DIMENSIONS: usize = D;

    fn get(&self, dimension: Dimension) -> Option<N> {
        self.as_slice().get(dimension).copied()
    }
}

/* -------------------------------------------- Axes -------------------------------------------- */

/// Accessor for any [`Point`]; dimension `i` is the point's `i`-th axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Axes;

impl<P: Point> Accessor<P> for Axes {
    type Num = P::Num;

    fn dimensions(&self) -> usize {
        P::DIMENSIONS
    }

    fn value(&self, point: &P, dimension: Dimension) -> Result<P::Num, DimensionNotFound> {
        point.get(dimension).ok_or(DimensionNotFound { dimension })
    }
}

/* ------------------------------------------ Closures ------------------------------------------ */

/// Accessor built from a closure, for point types that cannot implement [`Point`].
///
/// The closure returns `None` for dimensions the point does not have; that surfaces as
/// [`DimensionNotFound`].
pub struct FnAccessor<F, N> {
    dimensions: usize,
    visit: F,
    _phantom: PhantomData<fn() -> N>,
}

impl<F, N> FnAccessor<F, N> {
    pub fn new<P: ?Sized>(dimensions: usize, visit: F) -> Self
    where
        F: Fn(&P, Dimension) -> Option<N>,
    {
        Self {
            dimensions,
            visit,
            _phantom: PhantomData,
        }
    }
}

impl<F: Clone, N> Clone for FnAccessor<F, N> {
    fn clone(&self) -> Self {
        Self {
            dimensions: self.dimensions,
            visit: self.visit.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<F, N> fmt::Debug for FnAccessor<F, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAccessor")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl<P: ?Sized, F, N> Accessor<P> for FnAccessor<F, N>
where
    F: Fn(&P, Dimension) -> Option<N>,
    N: Number,
{
    type Num = N;

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn value(&self, point: &P, dimension: Dimension) -> Result<N, DimensionNotFound> {
        (self.visit)(point, dimension).ok_or(DimensionNotFound { dimension })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_axes() {
        let p = [3, 7];

        assert_eq!(<Axes as Accessor<[i32; 2]>>::dimensions(&Axes), 2);
        assert_eq!(Axes.value(&p, 0), Ok(3));
        assert_eq!(Axes.value(&p, 1), Ok(7));
        assert_eq!(Axes.value(&p, 2), Err(DimensionNotFound { dimension: 2 }));
    }

    #[test]
    fn closure() {
        let acc = FnAccessor::new(3, |p: &Vec<i64>, i: usize| p.get(i).copied());

        assert_eq!(Accessor::<Vec<i64>>::dimensions(&acc), 3);
        assert_eq!(acc.value(&vec![1, 2, 3], 2), Ok(3));
        assert_eq!(
            acc.value(&vec![1, 2], 2),
            Err(DimensionNotFound { dimension: 2 })
        );
    }
}
