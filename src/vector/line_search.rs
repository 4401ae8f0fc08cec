//! Line minimization of a multi-dimensional noisy function.
//!
//! The function is projected onto the line `x0 + t * dir`, a bracket is searched
//! starting from `[-step_left, step_right]`, and refined with Brent's method. The new
//! point is only accepted if its value is not distinguishably worse than the value at
//! `x0`. Otherwise `x0` is kept, but its value is sampled anew: the old sample may be
//! an outlier that made every other point look worse.

use ndarray::{aview1, Array1, ArrayView1};

use crate::error::{Error, Result};
use crate::logging::{LogLevel, LogManager};
use crate::noisy::{NoisyBracket, NoisyIOPair, NoisyIOPair1D, NoisyValue};
use crate::objective::NoisyFunction;
use crate::scalar::{BracketSearch, Brent, INV_RATIO, STD_FTOL, STD_XTOL};

/// A multi-dimensional function seen along a line, `t -> f(x0 + t * dir)`.
///
/// The direction need not be normalized.
pub struct Projection1D<'f, 'v, F: NoisyFunction + ?Sized> {
    func: &'f mut F,
    x0: ArrayView1<'v, f64>,
    dir: ArrayView1<'v, f64>,
    x: Array1<f64>,
}

impl<'f, 'v, F: NoisyFunction + ?Sized> Projection1D<'f, 'v, F> {
    /// # Errors
    ///
    /// `DimensionMismatch` if `x0`, `dir` and `func` disagree in size.
    pub fn new(
        func: &'f mut F,
        x0: ArrayView1<'v, f64>,
        dir: ArrayView1<'v, f64>,
    ) -> Result<Self> {
        const OP: &str = "Projection1D::new";
        Error::check_dim(OP, func.ndim(), x0.len())?;
        Error::check_dim(OP, x0.len(), dir.len())?;
        Ok(Projection1D {
            func,
            x0,
            dir,
            x: x0.to_owned(),
        })
    }

    /// The point of the full space at line position `t`.
    pub fn vec_from_x(&self, t: f64) -> Array1<f64> {
        &self.x0 + &(t * &self.dir)
    }
}

impl<'f, 'v, F: NoisyFunction + ?Sized> NoisyFunction for Projection1D<'f, 'v, F> {
    fn ndim(&self) -> usize {
        1
    }

    fn f(&mut self, t: ArrayView1<f64>) -> NoisyValue {
        self.x.assign(&self.x0);
        self.x.scaled_add(t[0], &self.dir);
        self.func.f(self.x.view())
    }
}

/// Parameters of [`multi_line_min`].
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct LineSearchParams {
    /// How far the initial bracket reaches backwards along the direction. Must be non-negative.
    #[builder(default = "0.0")]
    pub step_left: f64,

    /// How far the initial bracket reaches forwards along the direction. Must be positive.
    #[builder(default = "1.0")]
    pub step_right: f64,

    /// Evaluation budget of the bracket search.
    #[builder(default = "10")]
    pub max_n_bracket: usize,

    /// Iteration budget of the Brent refinement.
    #[builder(default = "20")]
    pub max_n_minimize: usize,

    /// Position tolerance in units of the direction length. Non-positive means default.
    #[builder(default = "STD_XTOL")]
    pub epsx: f64,

    /// Value tolerance. Non-positive means default.
    #[builder(default = "STD_FTOL")]
    pub epsf: f64,
}

impl Default for LineSearchParams {
    fn default() -> Self {
        LineSearchParams {
            step_left: 0.0,
            step_right: 1.0,
            max_n_bracket: 10,
            max_n_minimize: 20,
            epsx: STD_XTOL,
            epsf: STD_FTOL,
        }
    }
}

/// Minimizes `mdf` along `dir`, starting from the evaluated point `p0`.
///
/// The returned point is never distinguishably worse than `p0.f`.
///
/// # Errors
///
/// `DimensionMismatch` if `mdf`, `p0` and `dir` disagree in size, `InvalidArgument` if
/// `step_left < 0` or `step_right <= 0`.
pub fn multi_line_min<F>(
    mdf: &mut F,
    p0: NoisyIOPair,
    dir: ArrayView1<f64>,
    params: &LineSearchParams,
    log: &LogManager,
) -> Result<NoisyIOPair>
where
    F: NoisyFunction + ?Sized,
{
    const OP: &str = "multi_line_min";
    Error::check_dim(OP, mdf.ndim(), p0.ndim())?;
    Error::check_dim(OP, p0.ndim(), dir.len())?;
    if !(params.step_left >= 0.0) || !(params.step_right > 0.0) {
        return Err(Error::InvalidArgument {
            operation: OP,
            reason: "step_left must be non-negative and step_right positive",
        });
    }
    let epsx = if params.epsx > 0.0 { params.epsx } else { STD_XTOL };
    let epsf = if params.epsf > 0.0 { params.epsf } else { STD_FTOL };

    let new_point = {
        let mut proj = Projection1D::new(&mut *mdf, p0.x.view(), dir.reborrow())?;

        let ax = -params.step_left;
        let cx = params.step_right;
        let bx = ax + (cx - ax) * INV_RATIO;
        let fa = if ax == 0.0 {
            p0.f
        } else {
            proj.f(aview1(&[ax]))
        };
        let fb = proj.f(aview1(&[bx]));
        let fc = proj.f(aview1(&[cx]));
        let mut bracket = NoisyBracket::new(
            NoisyIOPair1D::new(ax, fa),
            NoisyIOPair1D::new(bx, fb),
            NoisyIOPair1D::new(cx, fc),
        );

        let search = BracketSearch {
            max_iter: params.max_n_bracket,
            epsx,
            log: log.clone(),
        };
        if search.find(&mut proj, &mut bracket)? {
            let brent = Brent {
                max_iter: params.max_n_minimize,
                epsx,
                epsf,
                log: log.clone(),
            };
            let min = brent.minimize(&mut proj, bracket)?;
            if min.f <= p0.f {
                Some(NoisyIOPair::new(proj.vec_from_x(min.x), min.f))
            } else {
                log.log_noisy_value(min.f, LogLevel::Verbose, "multi_line_min rejected", "f");
                None
            }
        } else {
            log.log_string("multi_line_min: no bracket found", LogLevel::Verbose);
            None
        }
    };

    match new_point {
        Some(p) => Ok(p),
        None => {
            let f = mdf.f(p0.x.view());
            Ok(NoisyIOPair::new(p0.x, f))
        }
    }
}
