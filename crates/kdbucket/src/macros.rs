/// Declares a point struct whose dimensions are its fields, in the order written.
///
/// ```
/// kdbucket::define_point!(
///     /// An employee record.
///     pub struct DataPoint: i32 {
///         age,
///         salary,
///     }
/// );
///
/// use kdbucket::Point;
///
/// let p = DataPoint::new(25, 60);
/// assert_eq!(p.get(1), Some(60));
/// assert_eq!(DataPoint::FIELDS, ["age", "salary"]);
/// ```
#[macro_export]
macro_rules! define_point {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $num:ty {
            $(
                $(#[$elem_meta:meta])*
                $elem:ident
            ),* $(,)?
        }

        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        $vis struct $name {
            $(
                $(#[$elem_meta])*
                pub $elem: $num,
            )*
        }

        #[allow(unused)]
        const _: () = {
            impl $name {
                /// Field names, indexed by dimension.
                pub const FIELDS: [&'static str; $crate::define_point!(@count $($elem )*)] =
                    [$(stringify!($elem)),*];

                #[inline]
                pub const fn new($($elem: $num),*) -> Self {
                    Self {
                        $($elem),*
                    }
                }

                #[inline]
                pub const fn to_array(self) -> [$num; $crate::define_point!(@count $($elem )*)] {
                    [$(self.$elem),*]
                }
            }

            impl $crate::accessor::Point for $name {
                type Num = $num;
                const DIMENSIONS: usize = $crate::define_point!(@count $($elem )*);

                #[inline]
                fn get(&self, dimension: $crate::primitive::Dimension) -> Option<$num> {
                    self.to_array().as_slice().get(dimension).copied()
                }
            }

            impl From<[$num; $crate::define_point!(@count $($elem )*)]> for $name {
                #[inline]
                fn from([$( $elem ),*]: [$num; $crate::define_point!(@count $($elem )*)]) -> Self {
                    Self {
                        $($elem,)*
                    }
                }
            }
        };

        $crate::define_point!( $($rest)* );
    };

    (@count) => { 0 };
    (@count $head:ident $($tail:ident)*) => { 1 + $crate::define_point!(@count $($tail)*) };

    () => {};
}

#[test]
fn foo() {
    use crate::accessor::{Accessor, Axes};

    define_point!(
        struct Sample: i64 {
            x,
            y,
            z,
        }

        struct Flat: f32 { u, v }
    );

    let v = Sample::new(1, 2, 3);
    assert_eq!(Sample::FIELDS, ["x", "y", "z"]);
    assert_eq!(v.to_array(), [1, 2, 3]);
    assert_eq!(Sample::from([1, 2, 3]), v);
    assert_eq!(Axes.value(&v, 2), Ok(3));
    assert!(Axes.value(&v, 3).is_err());
    assert_eq!(<Axes as Accessor<Sample>>::dimensions(&Axes), 3);

    let f = Flat::new(0.5, 1.5);
    assert_eq!(Axes.value(&f, 1), Ok(1.5));
    assert_eq!(crate::accessor::Point::get(&f, 0), Some(0.5));
    assert_eq!(crate::accessor::Point::get(&f, 2), None);
}
