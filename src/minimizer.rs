//! This module provides the framework shared by all multi-dimensional minimizers of this
//! crate: the [`UpdateRule`] trait implemented by each algorithm, and [`NoisyMinimizer`],
//! which drives any rule through one iterate-until-stable loop.
//!
//! The loop stops when the [`ConvergenceWindow`] reports that the value has stabilized,
//! when the rule cannot produce a further step, or on one of the optional limits of
//! [`NfmConfig`].
//!
//! Rules that ask for averaging do not stop at the first stabilization. From there on the
//! iterates only wander around the minimum, so the loop keeps stepping for
//! [`NfmConfig::n_averaged`] more iterations and reports the mean of these positions.

use ndarray::prelude::*;

use crate::convergence::{ConvergenceWindow, RingBuffer};
use crate::error::{Error, Result};
use crate::logging::{LogLevel, LogManager};
use crate::noisy::{NoisyIOPair, NoisyValue};
use crate::objective::NoisyFunctionWithGradient;

/// Stopping rules of the minimization loop.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct NfmConfig {
    /// Size of the convergence window. 0 disables the window, and an averaging rule then
    /// reports the mean of the last `n_averaged` positions once another limit ends the run.
    #[builder(default = "20")]
    pub max_n_const_values: usize,

    /// Number of positions averaged by rules that report an averaged result. Values below
    /// 1 count as 1.
    #[builder(default = "100")]
    pub n_averaged: usize,

    /// Iteration cap, 0 means unlimited.
    #[builder(default = "0")]
    pub max_n_iterations: usize,

    /// Stop when the norm of a position update is below this. 0 disables the check.
    #[builder(default = "0.0")]
    pub epsx: f64,

    /// Stop when the distance between consecutive values is below this. 0 disables the check.
    #[builder(default = "0.0")]
    pub epsf: f64,

    /// Stop when the target reports gradient errors and every gradient component is
    /// indistinguishable from zero.
    #[builder(default = "true")]
    pub use_grad_err_stop: bool,
}

impl Default for NfmConfig {
    fn default() -> Self {
        NfmConfig {
            max_n_const_values: 20,
            n_averaged: 100,
            max_n_iterations: 0,
            epsx: 0.0,
            epsf: 0.0,
            use_grad_err_stop: true,
        }
    }
}

/// What an [`UpdateRule`] gets to see of the running loop.
pub struct StepContext<'a> {
    pub log: &'a LogManager,
    use_grad_err_stop: bool,
}

impl<'a> StepContext<'a> {
    pub fn new(log: &'a LogManager, use_grad_err_stop: bool) -> Self {
        StepContext {
            log,
            use_grad_err_stop,
        }
    }

    /// Evaluates the gradient at `x`.
    ///
    /// Returns `None` if the gradient carries errors and all of its components are
    /// indistinguishable from zero: any step taken along it would follow the noise.
    pub fn gradient<F>(&self, target: &mut F, x: ArrayView1<f64>) -> Option<Array1<NoisyValue>>
    where
        F: NoisyFunctionWithGradient + ?Sized,
    {
        let grad_err = target.has_grad_err();
        let g = target.grad(x);
        self.log
            .log_noisy_vector(g.view(), LogLevel::Verbose, grad_err, "", "g");

        let zero = NoisyValue::exact(0.0);
        if self.use_grad_err_stop
            && grad_err
            && g.iter().all(|gi| !gi.is_distinguishable_from(&zero))
        {
            self.log.log_string(
                "Gradient is indistinguishable from zero.",
                LogLevel::Normal,
            );
            return None;
        }
        Some(g)
    }
}

/// One algorithm's way of going from the current point to the next.
pub trait UpdateRule {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Resets the internal state for a new run in `ndim` dimensions.
    fn init(&mut self, ndim: usize);

    /// Whether the reported minimum is the average of the positions visited after the
    /// run has stabilized rather than the last position.
    fn averaging(&self) -> bool {
        false
    }

    /// Computes and evaluates the next point. `Ok(None)` ends the run at `current`.
    fn step<F>(
        &mut self,
        target: &mut F,
        current: &NoisyIOPair,
        ctx: &StepContext,
    ) -> Result<Option<NoisyIOPair>>
    where
        F: NoisyFunctionWithGradient + ?Sized;
}

/// Runs an [`UpdateRule`] until the target value stabilizes.
///
/// # Examples
///
/// ```
/// # use ndarray::prelude::*;
/// # use noisymin::{NoisyMinimizer, NoisyValue};
/// # use noisymin::utils::WrappedGradient;
/// # use noisymin::vector::SgdBuilder;
/// let mut target = WrappedGradient::new(
///     2,
///     |x: ArrayView1<f64>| NoisyValue::exact(x.dot(&x)),
///     |x: ArrayView1<f64>| x.mapv(|xi| NoisyValue::exact(2.0 * xi)),
/// );
/// let sgd = SgdBuilder::default().step_size(0.5).beta(0.0).build().unwrap();
/// let mut min = NoisyMinimizer::new(sgd);
/// let res = min.minimize(&mut target, arr1(&[1.0, -2.0]).view()).unwrap();
/// assert_eq!(res.x, arr1(&[0.0, 0.0]));
/// ```
#[derive(Debug, Clone)]
pub struct NoisyMinimizer<R: UpdateRule> {
    pub config: NfmConfig,
    pub rule: R,
    pub log: LogManager,
    x: Option<Array1<f64>>,
    last: Option<NoisyIOPair>,
    n_iterations: usize,
}

impl<R: UpdateRule> NoisyMinimizer<R> {
    pub fn new(rule: R) -> Self {
        NoisyMinimizer {
            config: NfmConfig::default(),
            rule,
            log: LogManager::off(),
            x: None,
            last: None,
            n_iterations: 0,
        }
    }

    pub fn with_config(mut self, config: NfmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_log(mut self, log: LogManager) -> Self {
        self.log = log;
        self
    }

    /// Sets the starting position of the next [`find_min`](Self::find_min).
    pub fn set_x(&mut self, x: ArrayView1<f64>) {
        self.x = Some(x.to_owned());
    }

    /// The current position: the starting point before a run, the result after it.
    pub fn x(&self) -> Option<ArrayView1<f64>> {
        self.x.as_ref().map(|x| x.view())
    }

    /// The value reported by the last run.
    pub fn f(&self) -> Option<NoisyValue> {
        self.last.as_ref().map(|p| p.f)
    }

    pub fn last(&self) -> Option<&NoisyIOPair> {
        self.last.as_ref()
    }

    /// Number of accepted steps of the last run.
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Sets the starting position and runs [`find_min`](Self::find_min).
    pub fn minimize<F>(&mut self, target: &mut F, x0: ArrayView1<f64>) -> Result<NoisyIOPair>
    where
        F: NoisyFunctionWithGradient + ?Sized,
    {
        self.set_x(x0);
        self.find_min(target)
    }

    /// Minimizes `target` starting from the current position, which is then replaced by
    /// the result.
    ///
    /// # Errors
    ///
    /// `MissingPosition` if no position was set, `DimensionMismatch` if it does not fit
    /// the target, and any error raised by the rule.
    pub fn find_min<F>(&mut self, target: &mut F) -> Result<NoisyIOPair>
    where
        F: NoisyFunctionWithGradient + ?Sized,
    {
        const OP: &str = "NoisyMinimizer::find_min";
        let x0 = match self.x {
            Some(ref x) => x.clone(),
            None => return Err(Error::MissingPosition { operation: OP }),
        };
        Error::check_dim(OP, target.ndim(), x0.len())?;
        let ndim = x0.len();
        let name = self.rule.name();

        self.log
            .log_with(LogLevel::Normal, || format!("Begin {}::find_min", name));
        self.rule.init(ndim);

        let averaging = self.rule.averaging();
        let n_averaged = self.config.n_averaged.max(1);
        let mut window = ConvergenceWindow::new(self.config.max_n_const_values);
        let mut positions = RingBuffer::new(if averaging { n_averaged } else { 0 });
        let mut averaging_phase = false;

        let f0 = target.f(x0.view());
        let mut current = NoisyIOPair::new(x0, f0);
        self.log.log_io_pair(&current, LogLevel::Normal, "start");
        window.push(current.f);
        if averaging {
            positions.push(current.x.clone());
        }

        let mut iter = 0;
        loop {
            if self.config.max_n_iterations > 0 && iter >= self.config.max_n_iterations {
                self.log
                    .log_string("Maximum number of iterations reached.", LogLevel::Normal);
                break;
            }
            // the gradient stop only decides when averaging begins
            let grad_err_stop = self.config.use_grad_err_stop && !averaging_phase;
            let ctx = StepContext::new(&self.log, grad_err_stop);
            let next = match self.rule.step(target, &current, &ctx)? {
                Some(next) => next,
                None if averaging && !averaging_phase => {
                    self.begin_averaging(&mut positions);
                    averaging_phase = true;
                    continue;
                }
                None => break,
            };
            iter += 1;

            let dx = &next.x - &current.x;
            let step_norm = dx.dot(&dx).sqrt();
            let f_dist = next.f.min_dist(&current.f);
            current = next;
            self.log.log_io_pair(&current, LogLevel::Normal, "");
            if averaging {
                positions.push(current.x.clone());
            }

            if averaging_phase {
                if positions.is_full() {
                    break;
                }
            } else if window.push(current.f) {
                self.log.log_string("Cost function has stabilized.", LogLevel::Normal);
                if averaging {
                    self.begin_averaging(&mut positions);
                    averaging_phase = true;
                } else {
                    break;
                }
            }
            if self.config.epsx > 0.0 && step_norm < self.config.epsx {
                self.log
                    .log_string("Position change below epsx.", LogLevel::Normal);
                break;
            }
            if self.config.epsf > 0.0 && f_dist < self.config.epsf {
                self.log
                    .log_string("Value change below epsf.", LogLevel::Normal);
                break;
            }
        }

        if averaging && positions.len() > 1 {
            let mut mean = Array1::<f64>::zeros(ndim);
            for x in positions.iter() {
                mean += x;
            }
            mean /= positions.len() as f64;
            let f = target.f(mean.view());
            current = NoisyIOPair::new(mean, f);
            self.log.log_io_pair(&current, LogLevel::Normal, "averaged");
        }

        self.n_iterations = iter;
        self.x = Some(current.x.clone());
        self.last = Some(current.clone());
        self.log
            .log_with(LogLevel::Normal, || format!("End {}::find_min", name));
        Ok(current)
    }

    fn begin_averaging(&self, positions: &mut RingBuffer<Array1<f64>>) {
        positions.clear();
        self.log.log_with(LogLevel::Normal, || {
            format!(
                "Averaging the next {} positions.",
                positions.capacity()
            )
        });
    }
}
