//! Nonlinear conjugate gradient with noisy line searches.
//!
//! Each step builds the direction `d = -g + beta * d_prev` and hands the step length over to
//! [`multi_line_min`], which never accepts a point distinguishably worse than the current
//! one. When a line search keeps the current position, the next direction restarts from
//! the plain negative gradient.

use ndarray::prelude::*;

use crate::error::Result;
use crate::logging::LogLevel;
use crate::minimizer::{StepContext, UpdateRule};
use crate::noisy::NoisyIOPair;
use crate::objective::NoisyFunctionWithGradient;

use super::line_search::{multi_line_min, LineSearchParams};

/// How the previous direction enters the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConjGradMode {
    /// `beta = 0`
    SteepestDescent,
    /// `beta = |g|^2 / |g_prev|^2`
    FletcherReeves,
    /// `beta = g . (g - g_prev) / |g_prev|^2`
    #[default]
    PolakRibiere,
    /// Polak-Ribiere, restarting whenever `beta < 0`.
    PolakRibierePositive,
}

impl ConjGradMode {
    fn beta(self, g: ArrayView1<f64>, g_prev: ArrayView1<f64>) -> f64 {
        let norm_prev = g_prev.dot(&g_prev);
        if !(norm_prev > 0.0) {
            return 0.0;
        }
        match self {
            ConjGradMode::SteepestDescent => 0.0,
            ConjGradMode::FletcherReeves => g.dot(&g) / norm_prev,
            ConjGradMode::PolakRibiere => (g.dot(&g) - g.dot(&g_prev)) / norm_prev,
            ConjGradMode::PolakRibierePositive => {
                ((g.dot(&g) - g.dot(&g_prev)) / norm_prev).max(0.0)
            }
        }
    }
}

#[derive(Builder, Debug, Clone)]
pub struct ConjGrad {
    #[builder(default)]
    pub mode: ConjGradMode,

    #[builder(default)]
    pub line_search: LineSearchParams,

    #[builder(setter(skip))]
    prev_grad: Option<Array1<f64>>,

    #[builder(setter(skip))]
    prev_dir: Option<Array1<f64>>,
}

impl ConjGrad {
    /// Turns the minimizer into a steepest descent.
    pub fn configure_to_follow_simple_gradient(&mut self) {
        self.mode = ConjGradMode::SteepestDescent;
    }
}

impl UpdateRule for ConjGrad {
    fn name(&self) -> &'static str {
        "ConjGrad"
    }

    fn init(&mut self, _ndim: usize) {
        self.prev_grad = None;
        self.prev_dir = None;
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

        let mut dir = -&g;
        if let (Some(g_prev), Some(d_prev)) = (&self.prev_grad, &self.prev_dir) {
            let beta = self.mode.beta(g.view(), g_prev.view());
            dir.scaled_add(beta, d_prev);
        }
        ctx.log.log_vector(dir.view(), LogLevel::Verbose, "", "dir");

        let next = if dir.iter().all(|&di| di == 0.0) {
            let f = target.f(current.x.view());
            NoisyIOPair::new(current.x.clone(), f)
        } else {
            multi_line_min(target, current.clone(), dir.view(), &self.line_search, ctx.log)?
        };

        if next.x == current.x {
            self.prev_grad = None;
            self.prev_dir = None;
        } else {
            self.prev_grad = Some(g);
            self.prev_dir = Some(dir);
        }
        Ok(Some(next))
    }
}
