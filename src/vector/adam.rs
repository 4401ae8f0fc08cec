//! Adaptive moment estimation, as formulated in
//!
//! Diederik P. Kingma, Jimmy Ba. Adam: A Method for Stochastic Optimization.
//! ICLR 2015, arXiv:1412.6980
//!
//! Both moment estimates are bias-corrected, so that the first steps are not damped by the
//! zero initialization of the averages.

use ndarray::prelude::*;
use ndarray::Zip;

use crate::error::Result;
use crate::logging::LogLevel;
use crate::minimizer::{StepContext, UpdateRule};
use crate::noisy::NoisyIOPair;
use crate::objective::NoisyFunctionWithGradient;

#[derive(Builder, Debug, Clone)]
pub struct Adam {
    /// Step size.
    #[builder(default = "0.001")]
    pub alpha: f64,

    /// Decay rate of the first moment, in `[0, 1)`.
    #[builder(default = "0.9")]
    pub beta1: f64,

    /// Decay rate of the second raw moment, in `[0, 1)`.
    #[builder(default = "0.999")]
    pub beta2: f64,

    #[builder(default = "1e-8")]
    pub epsilon: f64,

    /// Report the mean of the positions visited after stabilization, see
    /// [`NfmConfig::n_averaged`](crate::NfmConfig::n_averaged).
    #[builder(default = "false")]
    pub averaging: bool,

    #[builder(setter(skip))]
    m: Array1<f64>,

    #[builder(setter(skip))]
    v: Array1<f64>,

    #[builder(setter(skip))]
    t: i32,
}

impl UpdateRule for Adam {
    fn name(&self) -> &'static str {
        "Adam"
    }

    fn init(&mut self, ndim: usize) {
        self.m = Array1::zeros(ndim);
        self.v = Array1::zeros(ndim);
        self.t = 0;
    }

    fn averaging(&self) -> bool {
        self.averaging
    }

    fn step<F>(
        &mut self,
        target: &mut F,
        current: &NoisyIOPair,
        ctx: &StepContext,
    ) -> Result<Option<NoisyIOPair>>
    where
        F: NoisyFunctionWithGradient + ?Sized,
    {
        let g = match ctx.gradient(target, current.x.view()) {
            Some(g) => g.mapv(|gi| gi.val),
            None => return Ok(None),
        };

        self.t = self.t.saturating_add(1);
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let c1 = 1.0 - b1.powi(self.t);
        let c2 = 1.0 - b2.powi(self.t);
        let alpha = self.alpha;

        let mut dx = Array1::<f64>::zeros(g.len());
        Zip::from(&mut dx)
            .and(&mut self.m)
            .and(&mut self.v)
            .and(&g)
            .for_each(|dxi, mi, vi, &gi| {
                *mi = b1 * *mi + (1.0 - b1) * gi;
                *vi = b2 * *vi + (1.0 - b2) * gi * gi;
                *dxi = -alpha * (*mi / c1) / ((*vi / c2).sqrt() + eps);
            });
        ctx.log.log_vector(dx.view(), LogLevel::Verbose, "", "dx");

        let x = &current.x + &dx;
        let f = target.f(x.view());
        Ok(Some(NoisyIOPair::new(x, f)))
    }
}
