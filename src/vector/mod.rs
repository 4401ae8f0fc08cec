//! Algorithms that search for local minima of noisy functions along multiple dimensions.
//!
//! Each minimizer is an [`UpdateRule`](crate::minimizer::UpdateRule) to be run by
//! [`NoisyMinimizer`](crate::minimizer::NoisyMinimizer).

pub mod line_search;

mod adam;
mod conj_grad;
mod sgd;

pub use self::line_search::{
    multi_line_min, LineSearchParams, LineSearchParamsBuilder, Projection1D,
};

pub use self::adam::{Adam, AdamBuilder};
pub use self::conj_grad::{ConjGrad, ConjGradBuilder, ConjGradMode};
pub use self::sgd::{Sgd, SgdBuilder, SgdMode};
