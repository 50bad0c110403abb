/* ---------------------------------------------------------------------------------------------- */
/*                                             TRAITS                                             */
/* ---------------------------------------------------------------------------------------------- */

use std::cmp::Ordering;
use std::fmt::Debug;

macro_rules! trait_alias {
	($vis:vis trait $name:ident {}, $($args:tt)*) => {
		$vis trait $name: $($args)+ {}
		impl<T> $name for T where T: $($args)+ {}
	};
}

trait_alias!(
    pub trait Number {},
    Copy + PartialOrd + Debug + num::Num
);

/// Index of a point dimension. Valid range is `0..dimensions`, and it wraps around when
/// the tree descends.
pub type Dimension = usize;

/* -------------------------------------------- Utils ------------------------------------------- */

/// Dimension used one level below `dimension`.
#[inline]
pub fn next_dimension(dimension: Dimension, dimensions: usize) -> Dimension {
    debug_assert!(dimensions > 0);
    (dimension + 1) % dimensions
}

/// Midpoint of the value range `lo..=hi`, divided with the number type's own division.
///
/// For integers this truncates toward zero, so `midpoint(2, 3) == 2`. It is not a
/// statistical median of the values in between.
///
/// Never overflows: both ends are halved before they are added, and the remainders
/// they dropped are added back afterwards.
#[inline]
pub fn midpoint<N: Number>(lo: N, hi: N) -> N {
    let zero = N::zero();
    let one = N::one();
    let two = one + one;

    let half = lo / two + hi / two;

    // Division doesn't truncate; nothing was dropped.
    if one / two != zero {
        return half;
    }

    // Each remainder is -1, 0 or 1, so this can't overflow either.
    let rem = lo % two + hi % two;
    let mid = half + rem / two;

    // An odd `rem` leaves a half that must be truncated toward zero.
    if rem == one && mid < zero {
        mid + one
    } else if rem + one == zero && mid > zero {
        mid - one
    } else {
        mid
    }
}

/// Total order used for sorting buckets. Incomparable values (NaN) are treated as equal,
/// which keeps the sort stable instead of panicking.
#[inline]
pub(crate) fn cmp_number<N: Number>(a: &N, b: &N) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_wraps() {
        assert_eq!(next_dimension(0, 2), 1);
        assert_eq!(next_dimension(1, 2), 0);
        assert_eq!(next_dimension(0, 1), 0);
    }

    #[test]
    fn midpoint_truncates() {
        assert_eq!(midpoint(25, 50), 37);
        assert_eq!(midpoint(60, 400), 230);
        assert_eq!(midpoint(2, 3), 2);
        assert_eq!(midpoint(-3, 0), -1);
        assert_eq!(midpoint(7u8, 7u8), 7);
        assert_eq!(midpoint(1.0f64, 2.0), 1.5);
    }

    #[test]
    fn midpoint_matches_wide_truncation() {
        let wide = |lo: i32, hi: i32| ((lo as i64 + hi as i64) / 2) as i32;

        let samples = [
            i32::MIN,
            i32::MIN + 1,
            -7,
            -3,
            -2,
            -1,
            0,
            1,
            2,
            3,
            7,
            i32::MAX - 1,
            i32::MAX,
        ];

        for lo in samples {
            for hi in samples {
                assert_eq!(midpoint(lo, hi), wide(lo, hi), "midpoint({lo}, {hi})");
            }
        }

        assert_eq!(midpoint(-3, 4), 0);
        assert_eq!(midpoint(-5, -3), -4);
        assert_eq!(midpoint(i32::MIN, i32::MAX), 0);
        assert_eq!(midpoint(i32::MAX - 1, i32::MAX), i32::MAX - 1);
        assert_eq!(midpoint(u8::MAX, u8::MAX), u8::MAX);
        assert_eq!(midpoint(u8::MAX - 1, u8::MAX), u8::MAX - 1);
    }

    #[test]
    fn midpoint_stays_finite() {
        let mid = midpoint(1.0e308f64, 1.5e308);
        assert!(mid.is_finite() && 1.0e308 < mid && mid < 1.5e308);

        assert_eq!(midpoint(f64::MAX, f64::MAX), f64::MAX);
        assert_eq!(midpoint(-f64::MAX, f64::MAX), 0.0);
        assert!(midpoint(f64::NEG_INFINITY, f64::INFINITY).is_nan());
    }
}
