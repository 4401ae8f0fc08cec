use ndarray::prelude::*;

use crate::error::{Error, Result};
use crate::noisy::NoisyValue;
use crate::objective::{NoisyFunction, NoisyFunctionWithGradient};

/// Adapts a closure into a [`NoisyFunction`] and counts its evaluations.
pub struct WrappedFunction<F: FnMut(ArrayView1<f64>) -> NoisyValue> {
    pub ndim: usize,
    pub num: usize,
    pub func: F,
}

impl<F: FnMut(ArrayView1<f64>) -> NoisyValue> WrappedFunction<F> {
    pub fn new(ndim: usize, func: F) -> Self {
        WrappedFunction { ndim, num: 0, func }
    }
}

impl<F: FnMut(ArrayView1<f64>) -> NoisyValue> NoisyFunction for WrappedFunction<F> {
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn f(&mut self, x: ArrayView1<f64>) -> NoisyValue {
        self.num += 1;
        (self.func)(x)
    }
}

/// Adapts a value closure and a gradient closure into a [`NoisyFunctionWithGradient`].
/// `num` counts value evaluations, `num_grad` gradient evaluations.
pub struct WrappedGradient<F, G>
where
    F: FnMut(ArrayView1<f64>) -> NoisyValue,
    G: FnMut(ArrayView1<f64>) -> Array1<NoisyValue>,
{
    pub ndim: usize,
    pub num: usize,
    pub num_grad: usize,
    pub grad_err: bool,
    pub func: F,
    pub grad: G,
}

impl<F, G> WrappedGradient<F, G>
where
    F: FnMut(ArrayView1<f64>) -> NoisyValue,
    G: FnMut(ArrayView1<f64>) -> Array1<NoisyValue>,
{
    pub fn new(ndim: usize, func: F, grad: G) -> Self {
        WrappedGradient {
            ndim,
            num: 0,
            num_grad: 0,
            grad_err: false,
            func,
            grad,
        }
    }
}

impl<F, G> NoisyFunction for WrappedGradient<F, G>
where
    F: FnMut(ArrayView1<f64>) -> NoisyValue,
    G: FnMut(ArrayView1<f64>) -> Array1<NoisyValue>,
{
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn f(&mut self, x: ArrayView1<f64>) -> NoisyValue {
        self.num += 1;
        (self.func)(x)
    }
}

impl<F, G> NoisyFunctionWithGradient for WrappedGradient<F, G>
where
    F: FnMut(ArrayView1<f64>) -> NoisyValue,
    G: FnMut(ArrayView1<f64>) -> Array1<NoisyValue>,
{
    fn has_grad_err(&self) -> bool {
        self.grad_err
    }

    fn grad(&mut self, x: ArrayView1<f64>) -> Array1<NoisyValue> {
        self.num_grad += 1;
        (self.grad)(x)
    }
}

/// Central finite-difference gradient of a noisy function. The sample errors of the two
/// evaluations are added in quadrature and propagated into each gradient component.
///
/// # Errors
///
/// `DimensionMismatch` if `xk` or `steps` do not fit the dimension of `func`.
pub fn approx_noisy_gradient<F>(
    func: &mut F,
    xk: ArrayView1<f64>,
    steps: ArrayView1<f64>,
) -> Result<Array1<NoisyValue>>
where
    F: NoisyFunction + ?Sized,
{
    const OP: &str = "approx_noisy_gradient";
    Error::check_dim(OP, func.ndim(), xk.len())?;
    Error::check_dim(OP, func.ndim(), steps.len())?;
    Ok(central_differences(func, xk, steps))
}

fn central_differences<F>(
    func: &mut F,
    xk: ArrayView1<f64>,
    steps: ArrayView1<f64>,
) -> Array1<NoisyValue>
where
    F: NoisyFunction + ?Sized,
{
    let mut grad = Array1::<NoisyValue>::default(xk.len());
    let mut x = xk.to_owned();
    for (k, &h) in steps.iter().enumerate() {
        x[k] = xk[k] + h;
        let fp = func.f(x.view());
        x[k] = xk[k] - h;
        let fm = func.f(x.view());
        x[k] = xk[k];
        grad[k] = NoisyValue::new(
            (fp.val - fm.val) / (2.0 * h),
            fp.err.hypot(fm.err) / (2.0 * h),
        );
    }
    grad
}

/// Makes any [`NoisyFunction`] differentiable through [`approx_noisy_gradient`].
pub struct NumericalGradient<F: NoisyFunction> {
    pub func: F,
    steps: Array1<f64>,
}

impl<F: NoisyFunction> NumericalGradient<F> {
    /// Uses the same step `h` along every dimension.
    pub fn new(func: F, h: f64) -> Self {
        let steps = Array1::from_elem(func.ndim(), h);
        NumericalGradient { func, steps }
    }

    /// Uses one step per dimension.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if there are not as many steps as dimensions.
    pub fn with_steps(func: F, steps: Array1<f64>) -> Result<Self> {
        Error::check_dim("NumericalGradient::with_steps", func.ndim(), steps.len())?;
        Ok(NumericalGradient { func, steps })
    }

    pub fn steps(&self) -> ArrayView1<f64> {
        self.steps.view()
    }

    /// # Errors
    ///
    /// `DimensionMismatch` if there are not as many steps as dimensions.
    pub fn set_steps(&mut self, steps: Array1<f64>) -> Result<()> {
        Error::check_dim("NumericalGradient::set_steps", self.func.ndim(), steps.len())?;
        self.steps = steps;
        Ok(())
    }
}

impl<F: NoisyFunction> NoisyFunction for NumericalGradient<F> {
    fn ndim(&self) -> usize {
        self.func.ndim()
    }

    fn f(&mut self, x: ArrayView1<f64>) -> NoisyValue {
        self.func.f(x)
    }
}

impl<F: NoisyFunction> NoisyFunctionWithGradient for NumericalGradient<F> {
    fn has_grad_err(&self) -> bool {
        true
    }

    fn grad(&mut self, x: ArrayView1<f64>) -> Array1<NoisyValue> {
        central_differences(&mut self.func, x, self.steps.view())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gradient() {
        let mut function = WrappedFunction::new(2, |x: ArrayView1<f64>| {
            NoisyValue::new(1.0 * x[0].powi(2) + 200. * x[1].powi(2), 1e-6)
        });
        let x = arr1(&[1.0, 1.0]);
        let steps = arr1(&[1e-3, 1e-4]);
        let res = approx_noisy_gradient(&mut function, x.view(), steps.view()).unwrap();

        assert_eq!(function.num, 4);
        assert_abs_diff_eq!(res[0].val, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(res[1].val, 400.0, epsilon = 1e-4);
        // sqrt(2) * 1e-6 / (2 * h)
        assert_abs_diff_eq!(res[0].err, 2f64.sqrt() * 1e-3 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn numerical_gradient_wrapper() {
        let inner = WrappedFunction::new(3, |x: ArrayView1<f64>| NoisyValue::exact(x.dot(&x)));
        let mut ng = NumericalGradient::new(inner, 1e-4);
        let x = arr1(&[0.5, -1.0, 2.0]);
        let (f, g) = ng.fgrad(x.view());

        assert_abs_diff_eq!(f.val, 5.25);
        for (gi, xi) in g.iter().zip(x.iter()) {
            assert_abs_diff_eq!(gi.val, 2.0 * xi, epsilon = 1e-8);
            assert_eq!(gi.err, 0.0);
        }
        assert!(ng.has_grad_err());
        assert_eq!(ng.func.num, 7);
    }

    #[test]
    fn steps_must_fit_the_dimension() {
        let mut inner = WrappedFunction::new(2, |x: ArrayView1<f64>| NoisyValue::exact(x.dot(&x)));
        let x = arr1(&[1.0, 1.0]);
        assert!(matches!(
            approx_noisy_gradient(&mut inner, x.view(), arr1(&[1e-3]).view()),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            approx_noisy_gradient(&mut inner, arr1(&[1.0]).view(), arr1(&[1e-3]).view()),
            Err(Error::DimensionMismatch { .. })
        ));
        assert_eq!(inner.num, 0);

        assert!(NumericalGradient::with_steps(inner, arr1(&[1e-3, 1e-3, 1e-3])).is_err());

        let inner = WrappedFunction::new(2, |x: ArrayView1<f64>| NoisyValue::exact(x.dot(&x)));
        let mut ng = NumericalGradient::with_steps(inner, arr1(&[1e-3, 1e-4])).unwrap();
        assert_eq!(ng.steps(), arr1(&[1e-3, 1e-4]));
        assert!(ng.set_steps(arr1(&[1e-3])).is_err());
        assert_eq!(ng.steps().len(), 2);
        assert_abs_diff_eq!(ng.grad(x.view())[1].val, 2.0, epsilon = 1e-8);
    }

    #[test]
    fn wrapped_gradient_counts() {
        let mut wg = WrappedGradient::new(
            1,
            |x: ArrayView1<f64>| NoisyValue::exact(x[0].powi(2)),
            |x: ArrayView1<f64>| arr1(&[NoisyValue::exact(2.0 * x[0])]),
        );
        let x = arr1(&[3.0]);
        assert_eq!(wg.f(x.view()).val, 9.0);
        assert_eq!(wg.grad(x.view())[0].val, 6.0);
        assert_eq!((wg.num, wg.num_grad), (1, 1));
    }
}
