//! Capabilities a target function can offer to the minimizers.
//!
//! Evaluation takes `&mut self`, since stochastic estimators usually carry a random
//! number generator or accumulated statistics.

use ndarray::{Array1, ArrayView1};

use crate::noisy::NoisyValue;

/// A function that can be sampled with noise at any point of its domain.
pub trait NoisyFunction {
    /// Number of input dimensions.
    fn ndim(&self) -> usize;

    /// Returns the value at `x` together with its standard error.
    fn f(&mut self, x: ArrayView1<f64>) -> NoisyValue;
}

/// A noisy function that can also provide its gradient.
pub trait NoisyFunctionWithGradient: NoisyFunction {
    /// Whether the `err` fields of [`grad`](Self::grad) results are meaningful.
    fn has_grad_err(&self) -> bool {
        false
    }

    /// Returns one noisy entry per dimension.
    fn grad(&mut self, x: ArrayView1<f64>) -> Array1<NoisyValue>;

    /// Value and gradient at once. Override when both can be computed together cheaply.
    fn fgrad(&mut self, x: ArrayView1<f64>) -> (NoisyValue, Array1<NoisyValue>) {
        let f = self.f(x);
        (f, self.grad(x))
    }
}

impl<'a, F: NoisyFunction + ?Sized> NoisyFunction for &'a mut F {
    fn ndim(&self) -> usize {
        (**self).ndim()
    }

    fn f(&mut self, x: ArrayView1<f64>) -> NoisyValue {
        (**self).f(x)
    }
}

impl<'a, F: NoisyFunctionWithGradient + ?Sized> NoisyFunctionWithGradient for &'a mut F {
    fn has_grad_err(&self) -> bool {
        (**self).has_grad_err()
    }

    fn grad(&mut self, x: ArrayView1<f64>) -> Array1<NoisyValue> {
        (**self).grad(x)
    }

    fn fgrad(&mut self, x: ArrayView1<f64>) -> (NoisyValue, Array1<NoisyValue>) {
        (**self).fgrad(x)
    }
}
