//! Minimization of functions that can only be sampled with a statistical error, such as
//! Monte Carlo estimators.
//!
//! Every value is a [`NoisyValue`], and every decision a minimizer takes compares such values
//! by the overlap of their error intervals. Iterative minimizers stop once the last accepted
//! values can no longer be told apart, see [`convergence`].
//!
//! * [`scalar`]: bracketing and Brent's method along one dimension.
//! * [`vector`]: line minimization, and the update rules [`Sgd`](vector::Sgd),
//!   [`Adam`](vector::Adam) and [`ConjGrad`](vector::ConjGrad), each driven by a
//!   [`NoisyMinimizer`].
//!
//! # Examples
//!
//! ```
//! # use ndarray::prelude::*;
//! # use noisymin::{NoisyMinimizer, NoisyValue};
//! # use noisymin::utils::WrappedGradient;
//! # use noisymin::vector::ConjGradBuilder;
//! let mut target = WrappedGradient::new(
//!     2,
//!     |x: ArrayView1<f64>| NoisyValue::exact((x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2)),
//!     |x: ArrayView1<f64>| {
//!         arr1(&[
//!             NoisyValue::exact(2.0 * (x[0] - 1.0)),
//!             NoisyValue::exact(2.0 * (x[1] + 2.0)),
//!         ])
//!     },
//! );
//! let mut min = NoisyMinimizer::new(ConjGradBuilder::default().build().unwrap());
//! let res = min.minimize(&mut target, arr1(&[-1.0, -1.0]).view()).unwrap();
//! assert!((res.x[0] - 1.0).abs() < 1e-6);
//! assert!((res.x[1] + 2.0).abs() < 1e-6);
//! ```

#[macro_use]
extern crate derive_builder;

pub mod convergence;
pub mod error;
pub mod logging;
pub mod minimizer;
pub mod noisy;
pub mod objective;
pub mod scalar;
pub mod utils;
pub mod vector;

pub use crate::convergence::ConvergenceWindow;
pub use crate::error::{Error, Result};
pub use crate::logging::{LogLevel, LogManager};
pub use crate::minimizer::{NfmConfig, NfmConfigBuilder, NoisyMinimizer, StepContext, UpdateRule};
pub use crate::noisy::{NoisyBracket, NoisyIOPair, NoisyIOPair1D, NoisyValue};
pub use crate::objective::{NoisyFunction, NoisyFunctionWithGradient};
