//! This module contains algorithms that search for local minima of noisy functions along a
//! single dimension: [`BracketSearch`] localizes a minimum between three points, and
//! [`Brent`] refines such a bracket.
//!
//! Functions passed to these algorithms must report `ndim() == 1`.

mod bracket;
mod brent;

pub use self::bracket::{BracketSearch, BracketSearchBuilder};
pub use self::brent::{Brent, BrentBuilder};

use ndarray::aview1;

use crate::error::{Error, Result};
use crate::noisy::{NoisyBracket, NoisyValue};
use crate::objective::NoisyFunction;

/// Square of the golden ratio, the factor by which a bracket is widened.
pub const RATIO: f64 = 2.618033988749895;

/// Golden section fraction `1 / RATIO`, placing interior points of a bracket.
pub const INV_RATIO: f64 = 0.3819660112501051;

/// Default minimal bracket width.
pub const STD_XTOL: f64 = 1e-8;

/// Default minimal distinguishable value gap.
pub const STD_FTOL: f64 = 1e-8;

fn check_1d<F: NoisyFunction + ?Sized>(f1d: &F, operation: &'static str) -> Result<()> {
    match f1d.ndim() {
        1 => Ok(()),
        ndim => Err(Error::NotOneDimensional { operation, ndim }),
    }
}

fn validate_bracket_x(bracket: &NoisyBracket, operation: &'static str) -> Result<()> {
    let (a, b, c) = (bracket.a.x, bracket.b.x, bracket.c.x);
    if !(a < c) {
        return Err(Error::InvalidBracket {
            operation,
            reason: "bracket violates a.x < c.x",
        });
    }
    if !(a < b && b < c) {
        return Err(Error::InvalidBracket {
            operation,
            reason: "bracket violates a.x < b.x < c.x",
        });
    }
    Ok(())
}

#[inline]
fn eval_1d<F: NoisyFunction + ?Sized>(f1d: &mut F, x: f64) -> NoisyValue {
    f1d.f(aview1(&[x]))
}
