//! Bracketing of a one-dimensional noisy minimum.
//!
//! A bracket is a triple `a.x < b.x < c.x` with `a.f > b.f < c.f`, where the comparisons
//! are the noisy ones of [`NoisyValue`](crate::NoisyValue). The search has two phases:
//!
//! 1. While the middle value cannot be told apart from one of its neighbours, the
//!    bracket is widened by the golden ratio around `a`:
//!    ```text
//!            +----+----+
//!    before  a    b    c
//!            +---------+-----------------+
//!    after   a         b                 c
//!    ```
//! 2. Otherwise the triple walks downhill: if `b` is below `a` it moves past `c`, else it
//!    contracts towards `a`, putting a new middle point at the golden section of `[a, b]`.
//!
//! Both phases share one iteration budget and give up once either sub-interval is
//! narrower than `epsx`.

use crate::error::Result;
use crate::logging::LogManager;
use crate::noisy::{NoisyBracket, NoisyIOPair1D};
use crate::objective::NoisyFunction;

use super::{check_1d, eval_1d, validate_bracket_x, INV_RATIO, RATIO, STD_XTOL};

#[derive(Builder, Debug, Clone)]
pub struct BracketSearch {
    /// The maximum number of function evaluations before the search gives up.
    #[builder(default = "100")]
    pub max_iter: usize,

    /// The minimal width of both sub-intervals of the bracket.
    #[builder(default = "STD_XTOL")]
    pub epsx: f64,

    #[builder(default)]
    pub log: LogManager,
}

impl BracketSearch {
    /// Searches for a valid bracket, starting from `bracket` and updating it in place.
    ///
    /// The initial points need not be bracketing, but `a` and `c` must lie on different
    /// sides of `b` (they are swapped if given in descending order). Returns `Ok(true)` if
    /// `bracket` now holds a valid bracket. On `Ok(false)` it holds the last, unusable state.
    ///
    /// # Errors
    ///
    /// `NotOneDimensional` if `f1d` is not one-dimensional, `InvalidBracket` if the
    /// positions are not strictly ordered.
    pub fn find<F>(&self, f1d: &mut F, bracket: &mut NoisyBracket) -> Result<bool>
    where
        F: NoisyFunction + ?Sized,
    {
        const OP: &str = "BracketSearch::find";
        check_1d(f1d, OP)?;
        if bracket.a.x > bracket.c.x {
            std::mem::swap(&mut bracket.a, &mut bracket.c);
        }
        validate_bracket_x(bracket, OP)?;
        let epsx = self.epsx.max(0.0);

        let mut iter = 0;
        self.log.log_bracket("find_bracket init", bracket);

        while bracket.has_equals() {
            if !bracket.check_x_tol(epsx) || iter >= self.max_iter {
                return Ok(false);
            }
            iter += 1;

            bracket.b = bracket.c;
            let x = bracket.a.x + (bracket.b.x - bracket.a.x) * RATIO;
            bracket.c = NoisyIOPair1D::new(x, eval_1d(f1d, x));
            self.log.log_bracket("find_bracket pre-step (scale)", bracket);
        }

        while !bracket.has_equals() {
            if !bracket.check_x_tol(epsx) {
                return Ok(false);
            }
            if bracket.is_bracketed() {
                self.log.log_bracket("find_bracket final", bracket);
                return Ok(true);
            }
            if iter >= self.max_iter {
                return Ok(false);
            }
            iter += 1;

            if bracket.b.f < bracket.a.f {
                // a.f > b.f > c.f: move up
                let x = bracket.b.x + (bracket.c.x - bracket.b.x) * RATIO;
                bracket.a = bracket.b;
                bracket.b = bracket.c;
                bracket.c = NoisyIOPair1D::new(x, eval_1d(f1d, x));
                self.log.log_bracket("find_bracket step (move)", bracket);
            } else {
                // a.f < b.f: contract towards a
                bracket.c = bracket.b;
                let x = bracket.a.x + (bracket.c.x - bracket.a.x) * INV_RATIO;
                bracket.b = NoisyIOPair1D::new(x, eval_1d(f1d, x));
                self.log.log_bracket("find_bracket step (contract)", bracket);
            }
        }
        Ok(false)
    }
}
