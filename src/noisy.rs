//! Values carrying a statistical error, and the input/output records built from them.
//!
//! Two noisy values are considered *equal* whenever their one-sigma intervals
//! `[val - err, val + err]` overlap. A value is *greater* than another only if
//! the two are distinguishable and its nominal value is larger. Consequently the
//! comparison operators on [`NoisyValue`] are neither transitive nor a total order:
//! they answer "can these two measurements be told apart?", which is the only
//! question a minimizer can ask reliably of noisy samples.
//!
//! # Examples
//!
//! ```
//! # use noisymin::NoisyValue;
//! let a = NoisyValue::new(1.0, 0.5);
//! let b = NoisyValue::new(1.8, 0.5);
//! let c = NoisyValue::new(2.5, 0.25);
//!
//! assert!(a == b); // intervals [0.5, 1.5] and [1.3, 2.3] overlap
//! assert!(c > a);
//! assert_eq!(a.min_dist(&c), 0.75);
//! ```

use std::cmp::Ordering;
use std::fmt;

use ndarray::Array1;

/// A measured scalar and its estimated standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoisyValue {
    pub val: f64,
    pub err: f64,
}

impl NoisyValue {
    /// Creates a noisy value. Negative errors are stored by magnitude.
    pub fn new(val: f64, err: f64) -> Self {
        NoisyValue {
            val,
            err: err.abs(),
        }
    }

    /// A value without uncertainty.
    pub fn exact(val: f64) -> Self {
        NoisyValue { val, err: 0.0 }
    }

    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.val - self.err
    }

    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.val + self.err
    }

    /// True if the error intervals of `self` and `other` do not overlap.
    #[inline]
    pub fn is_distinguishable_from(&self, other: &NoisyValue) -> bool {
        !(self.lower_bound() <= other.upper_bound() && other.lower_bound() <= self.upper_bound())
    }

    /// Gap between the nearer bounds of the two intervals, or 0 if they overlap.
    pub fn min_dist(&self, other: &NoisyValue) -> f64 {
        if !self.is_distinguishable_from(other) {
            0.0
        } else if self.val > other.val {
            self.lower_bound() - other.upper_bound()
        } else {
            other.lower_bound() - self.upper_bound()
        }
    }
}

/// Two values are equal when their error intervals overlap.
///
/// This relation is not transitive: `a == b` and `b == c` do not imply `a == c`. Collection
/// methods that rely on `PartialEq` being an equivalence, like `Vec::dedup` or
/// `Vec::contains`, therefore answer for interval overlap with a particular element and
/// not for a partition of the values.
impl PartialEq for NoisyValue {
    fn eq(&self, other: &NoisyValue) -> bool {
        !self.is_distinguishable_from(other)
    }
}

/// Orders distinguishable values by `val` and reports overlapping ones as `Equal`.
///
/// Inherits the missing transitivity of `==`, so it is not a consistent order: sorting a
/// slice with it gives an unspecified arrangement of overlapping values. Compare `val`
/// directly where a total order is needed.
impl PartialOrd for NoisyValue {
    fn partial_cmp(&self, other: &NoisyValue) -> Option<Ordering> {
        if *self == *other {
            Some(Ordering::Equal)
        } else if self.val > other.val {
            Some(Ordering::Greater)
        } else if self.val < other.val {
            Some(Ordering::Less)
        } else {
            None // NaN involved
        }
    }
}

impl fmt::Display for NoisyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} +- {}", self.val, self.err)
    }
}

/// An evaluated point of a multi-dimensional noisy function.
#[derive(Debug, Clone)]
pub struct NoisyIOPair {
    pub x: Array1<f64>,
    pub f: NoisyValue,
}

impl NoisyIOPair {
    pub fn new(x: Array1<f64>, f: NoisyValue) -> Self {
        NoisyIOPair { x, f }
    }

    pub fn ndim(&self) -> usize {
        self.x.len()
    }
}

/// An evaluated point of a one-dimensional noisy function.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoisyIOPair1D {
    pub x: f64,
    pub f: NoisyValue,
}

impl NoisyIOPair1D {
    pub fn new(x: f64, f: NoisyValue) -> Self {
        NoisyIOPair1D { x, f }
    }
}

/// Three points localizing a one-dimensional minimum.
///
/// A valid bracket has `a.x < b.x < c.x` and `a.f > b.f < c.f` in the noisy sense.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoisyBracket {
    pub a: NoisyIOPair1D,
    pub b: NoisyIOPair1D,
    pub c: NoisyIOPair1D,
}

impl NoisyBracket {
    pub fn new(a: NoisyIOPair1D, b: NoisyIOPair1D, c: NoisyIOPair1D) -> Self {
        NoisyBracket { a, b, c }
    }

    /// Does `b` lie distinguishably below both outer points?
    pub fn is_bracketed(&self) -> bool {
        self.a.f > self.b.f && self.b.f < self.c.f
    }

    /// Is the middle value indistinguishable from either neighbour?
    pub fn has_equals(&self) -> bool {
        self.a.f == self.b.f || self.b.f == self.c.f
    }

    /// Are both sub-intervals wider than `epsx`?
    pub fn check_x_tol(&self, epsx: f64) -> bool {
        (self.c.x - self.b.x).abs() > epsx && (self.b.x - self.a.x).abs() > epsx
    }

    /// Are both value gaps wider than `epsf`?
    pub fn check_f_tol(&self, epsf: f64) -> bool {
        self.a.f.min_dist(&self.b.f) > epsf && self.c.f.min_dist(&self.b.f) > epsf
    }
}
