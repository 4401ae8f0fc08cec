//! Stochastic gradient descent.
//!
//! Two step rules share the same accumulators, so the mode can be switched on an existing
//! instance between runs without losing what has been learned about the gradient:
//!
//! * [`SgdMode::Momentum`]: `m = beta * m + (1 - beta) * g`, then `x -= step_size * m`.
//!   With `beta = 0` this is plain gradient descent.
//! * [`SgdMode::AdaDelta`]: per coordinate, the step is
//!   `-sqrt(w + epsilon) / sqrt(v + epsilon) * g`, where `v` and `w` are the decaying averages
//!   of the squared gradients and of the squared steps. `step_size` is only used for the
//!   first step, which seeds `w`.

use ndarray::prelude::*;
use ndarray::Zip;

use crate::error::Result;
use crate::logging::LogLevel;
use crate::minimizer::{StepContext, UpdateRule};
use crate::noisy::NoisyIOPair;
use crate::objective::NoisyFunctionWithGradient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SgdMode {
    #[default]
    Momentum,
    AdaDelta,
}

#[derive(Builder, Debug, Clone)]
pub struct Sgd {
    /// Step length factor of the momentum mode.
    #[builder(default = "0.001")]
    pub step_size: f64,

    /// Decay rate of all moving averages, in `[0, 1)`.
    #[builder(default = "0.9")]
    pub beta: f64,

    /// Offset keeping the AdaDelta divisions finite.
    #[builder(default = "1e-8")]
    pub epsilon: f64,

    #[builder(default)]
    pub mode: SgdMode,

    /// Report the mean of the positions visited after stabilization, see
    /// [`NfmConfig::n_averaged`](crate::NfmConfig::n_averaged).
    #[builder(default = "false")]
    pub averaging: bool,

    #[builder(setter(skip))]
    m: Array1<f64>,

    #[builder(setter(skip))]
    v: Array1<f64>,

    #[builder(setter(skip))]
    w: Array1<f64>,

    #[builder(setter(skip))]
    seeded: bool,
}

impl Sgd {
    /// Forgets all accumulated averages.
    pub fn reset(&mut self) {
        let ndim = self.m.len();
        self.m = Array1::zeros(ndim);
        self.v = Array1::zeros(ndim);
        self.w = Array1::zeros(ndim);
        self.seeded = false;
    }

    fn ada_delta_step(&mut self, g: &Array1<f64>) -> Array1<f64> {
        let (beta, eps) = (self.beta, self.epsilon);
        let dx = if self.seeded {
            Zip::from(g)
                .and(&self.v)
                .and(&self.w)
                .map_collect(|&gi, &vi, &wi| -(wi + eps).sqrt() / (vi + eps).sqrt() * gi)
        } else {
            -self.step_size * g
        };
        self.seeded = true;
        Zip::from(&mut self.w)
            .and(&dx)
            .for_each(|wi, &di| *wi = beta * *wi + (1.0 - beta) * di * di);
        dx
    }
}

impl UpdateRule for Sgd {
    fn name(&self) -> &'static str {
        "SGD"
    }

    /// Accumulators survive as long as the dimension does not change.
    fn init(&mut self, ndim: usize) {
        if self.m.len() != ndim {
            self.m = Array1::zeros(ndim);
            self.reset();
        }
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

        let beta = self.beta;
        self.m *= beta;
        self.m.scaled_add(1.0 - beta, &g);
        Zip::from(&mut self.v)
            .and(&g)
            .for_each(|vi, &gi| *vi = beta * *vi + (1.0 - beta) * gi * gi);

        let dx = match self.mode {
            SgdMode::Momentum => -self.step_size * &self.m,
            SgdMode::AdaDelta => self.ada_delta_step(&g),
        };
        ctx.log.log_vector(dx.view(), LogLevel::Verbose, "", "dx");

        let x = &current.x + &dx;
        let f = target.f(x.view());
        Ok(Some(NoisyIOPair::new(x, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogManager;
    use crate::noisy::NoisyValue;
    use crate::utils::WrappedGradient;
    use approx::assert_abs_diff_eq;

    /// `f(x) = 2 x`, whose gradient is constant.
    fn slope() -> WrappedGradient<
        impl FnMut(ArrayView1<f64>) -> NoisyValue,
        impl FnMut(ArrayView1<f64>) -> Array1<NoisyValue>,
    > {
        WrappedGradient::new(
            1,
            |x: ArrayView1<f64>| NoisyValue::exact(2.0 * x[0]),
            |_: ArrayView1<f64>| arr1(&[NoisyValue::exact(2.0)]),
        )
    }

    fn start() -> NoisyIOPair {
        NoisyIOPair::new(arr1(&[0.0]), NoisyValue::exact(0.0))
    }

    #[test]
    fn momentum_accumulates() {
        let log = LogManager::off();
        let ctx = StepContext::new(&log, true);
        let mut f = slope();
        let mut sgd = SgdBuilder::default().step_size(1.0).beta(0.5).build().unwrap();
        sgd.init(1);

        let p1 = sgd.step(&mut f, &start(), &ctx).unwrap().unwrap();
        assert_abs_diff_eq!(p1.x[0], -1.0);
        assert_abs_diff_eq!(p1.f.val, -2.0);
        let p2 = sgd.step(&mut f, &p1, &ctx).unwrap().unwrap();
        assert_abs_diff_eq!(p2.x[0], -2.5);
    }

    #[test]
    fn ada_delta_is_seeded_by_the_step_size() {
        let log = LogManager::off();
        let ctx = StepContext::new(&log, true);
        let mut f = slope();
        let mut sgd = SgdBuilder::default()
            .step_size(0.1)
            .mode(SgdMode::AdaDelta)
            .build()
            .unwrap();
        sgd.init(1);

        let p1 = sgd.step(&mut f, &start(), &ctx).unwrap().unwrap();
        assert_abs_diff_eq!(p1.x[0], -0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(sgd.v[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(sgd.w[0], 0.004, epsilon = 1e-12);

        let p2 = sgd.step(&mut f, &p1, &ctx).unwrap().unwrap();
        let expected = -(0.004f64 + 1e-8).sqrt() / (0.76f64 + 1e-8).sqrt() * 2.0;
        assert_abs_diff_eq!(p2.x[0] - p1.x[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn switching_mode_keeps_the_averages() {
        let log = LogManager::off();
        let ctx = StepContext::new(&log, true);
        let mut f = slope();
        let mut sgd = SgdBuilder::default().step_size(0.1).build().unwrap();
        sgd.init(1);
        let p1 = sgd.step(&mut f, &start(), &ctx).unwrap().unwrap();

        sgd.mode = SgdMode::AdaDelta;
        sgd.init(1);
        assert_abs_diff_eq!(sgd.v[0], 0.4, epsilon = 1e-12);
        sgd.step(&mut f, &p1, &ctx).unwrap().unwrap();
        assert_abs_diff_eq!(sgd.m[0], 0.38, epsilon = 1e-12);

        sgd.reset();
        assert_eq!(sgd.v[0], 0.0);
        assert!(!sgd.seeded);

        sgd.init(3);
        assert_eq!(sgd.m.len(), 3);
        assert_eq!(sgd.w.len(), 3);
    }

    #[test]
    fn meaningless_gradient_ends_the_run() {
        let log = LogManager::off();
        let ctx = StepContext::new(&log, true);
        let mut f = WrappedGradient::new(
            1,
            |x: ArrayView1<f64>| NoisyValue::new(x[0], 1.0),
            |_: ArrayView1<f64>| arr1(&[NoisyValue::new(0.5, 1.0)]),
        );
        f.grad_err = true;
        let mut sgd = SgdBuilder::default().build().unwrap();
        sgd.init(1);
        assert!(sgd.step(&mut f, &start(), &ctx).unwrap().is_none());
        assert_eq!(f.num, 0);
    }
}
