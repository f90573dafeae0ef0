pub use num::traits::Float;
pub use num::{One, Zero};

use std::fmt::{Debug, Display};
use std::iter::Sum;
pub use std::ops::{AddAssign, MulAssign, SubAssign};

pub trait Numeric:
    Float + AddAssign + SubAssign + MulAssign + Sum + Debug + Display + Default + 'static
{
    /// Cast an `f64` literal or sample into this type.
    fn constant(value: f64) -> Self;

    fn as_f64(self) -> f64;
}

// https://stackoverflow.com/questions/42381185/specifying-generic-parameter-to-belong-to-a-small-set-of-types
macro_rules! numeric_impl {
    ($($t: ty),+) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn constant(value: f64) -> Self {
                    value as $t
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }
            }
        )+
    }
}

numeric_impl!(f32, f64);
