//! Brent's minimization for noisy functions, adapted from the GSL implementation.
//!
//! Starting from a valid bracket `lb < m < ub`, each iteration either fits a parabola
//! through the three best points seen so far (`m`, `w`, `v`) or, if the fit is not
//! trustworthy, takes a golden-section step into the larger sub-interval.
//!
//! Deciding which point is the current best uses the *upper bound* of the noisy values:
//! a trial point replaces `m` only if its upper bound is not above the one of `m`. A
//! nominally low sample could just be lucky, while a low upper bound is safer.
//! Deciding on which side the bracket shrinks only needs positions, which are exact.
//!
//! The search stops when either sub-interval becomes narrower than `epsx`, when the value
//! gaps towards both bounds drop below `epsf`, or after `max_iter` iterations. The value
//! at the returned point is sampled once more, so that the reported value is not biased
//! by having kept the best of many noisy samples.

use float_cmp::ApproxEqUlps;

use crate::error::{Error, Result};
use crate::logging::LogManager;
use crate::noisy::{NoisyBracket, NoisyIOPair1D};
use crate::objective::NoisyFunction;

use super::{check_1d, eval_1d, validate_bracket_x, INV_RATIO, STD_FTOL, STD_XTOL};

static ULPS: i64 = 1;

#[derive(Builder, Debug, Clone)]
pub struct Brent {
    /// The maximum number of iterations.
    #[builder(default = "20")]
    pub max_iter: usize,

    /// Minimal width of the sub-intervals of the bracket.
    #[builder(default = "STD_XTOL")]
    pub epsx: f64,

    /// Minimal distinguishable distance between the value at the current minimum
    /// and the values at the bracket bounds.
    #[builder(default = "STD_FTOL")]
    pub epsf: f64,

    #[builder(default)]
    pub log: LogManager,
}

impl Brent {
    /// Refines `bracket`, which must be valid (see [`BracketSearch`](super::BracketSearch)),
    /// and returns the best point found. Its position always lies within
    /// `[bracket.a.x, bracket.c.x]`.
    ///
    /// # Errors
    ///
    /// `NotOneDimensional` if `f1d` is not one-dimensional, `InvalidBracket` if `bracket`
    /// is not ordered or does not bracket a minimum.
    pub fn minimize<F>(&self, f1d: &mut F, bracket: NoisyBracket) -> Result<NoisyIOPair1D>
    where
        F: NoisyFunction + ?Sized,
    {
        const OP: &str = "Brent::minimize";
        check_1d(f1d, OP)?;
        validate_bracket_x(&bracket, OP)?;
        if !bracket.is_bracketed() {
            return Err(Error::InvalidBracket {
                operation: OP,
                reason: "bracket violates a.f > b.f < c.f",
            });
        }
        let epsx = self.epsx.max(0.0);
        let epsf = self.epsf.max(0.0);

        let NoisyBracket {
            a: mut lb,
            b: mut m,
            c: mut ub,
        } = bracket;

        let mut d = 0.0f64;
        let mut e = 0.0f64;
        let vx = lb.x + INV_RATIO * (ub.x - lb.x);
        let mut v = NoisyIOPair1D::new(vx, eval_1d(f1d, vx));
        let mut w = v;

        for _ in 0..self.max_iter {
            let current = NoisyBracket::new(lb, m, ub);
            if !current.check_x_tol(epsx) || !current.check_f_tol(epsf) {
                break;
            }

            let m_to_lb = m.x - lb.x;
            let m_to_ub = ub.x - m.x;
            let xm = 0.5 * (lb.x + ub.x);
            let tol = 1.5e-8 * m.x.abs();

            let mut p = 0.0;
            let mut q = 0.0;
            let mut r = 0.0;

            if e.abs() > tol {
                r = (m.x - w.x) * (m.f.val - v.f.val);
                q = (m.x - v.x) * (m.f.val - w.f.val);
                p = (m.x - v.x) * q - (m.x - w.x) * r;
                q = 2.0 * (q - r);

                if q > 0.0 {
                    p = -p;
                } else {
                    q = -q;
                }
                r = e;
                e = d;
            }

            let parabolic = p.abs() < (0.5 * q * r).abs() && p < q * m_to_lb && p < q * m_to_ub;
            if parabolic {
                let t2 = 2.0 * tol;
                d = p / q;
                let ux = m.x + d;
                // stay clear of the bounds
                if (ux - lb.x) < t2 || (ub.x - ux) < t2 {
                    d = if m.x < xm { tol } else { -tol };
                }
            } else {
                e = if m.x < xm { ub.x - m.x } else { -(m.x - lb.x) };
                d = INV_RATIO * e;
            }

            // never sample closer than tol to m
            let ux = if d.abs() >= tol {
                m.x + d
            } else if d > 0.0 {
                m.x + tol
            } else {
                m.x - tol
            };
            let u = NoisyIOPair1D::new(ux, eval_1d(f1d, ux));

            if u.f.upper_bound() <= m.f.upper_bound() {
                if u.x < m.x {
                    ub = m;
                } else {
                    lb = m;
                }
                v = w;
                w = m;
                m = u;
            } else {
                if u.x < m.x {
                    lb = u;
                } else {
                    ub = u;
                }
                if u.f <= w.f || w.x.approx_eq_ulps(&m.x, ULPS) {
                    v = w;
                    w = u;
                } else if u.f <= v.f
                    || v.x.approx_eq_ulps(&m.x, ULPS)
                    || v.x.approx_eq_ulps(&w.x, ULPS)
                {
                    v = u;
                }
            }

            self.log.log_bracket(
                if parabolic {
                    "brent_min step (parabola)"
                } else {
                    "brent_min step (goldsect)"
                },
                &NoisyBracket::new(lb, m, ub),
            );
        }

        self.log
            .log_bracket("brent_min final", &NoisyBracket::new(lb, m, ub));

        m.f = eval_1d(f1d, m.x);
        Ok(m)
    }
}
