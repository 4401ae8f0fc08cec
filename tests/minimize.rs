use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use noisymin::utils::{NumericalGradient, WrappedFunction};
use noisymin::vector::{AdamBuilder, ConjGradBuilder, ConjGradMode, SgdBuilder, SgdMode};
use noisymin::{
    NfmConfigBuilder, NoisyFunction, NoisyFunctionWithGradient, NoisyMinimizer, NoisyValue,
};

const MINIMUM: [f64; 3] = [0.0, -1.0, 2.0];
const START: [f64; 3] = [2.5, 1.0, -1.0];

/// `x^2 + (y + 1)^2 + (z - 2)^2`, optionally with gaussian noise on values and gradients.
struct Parabola3D {
    sigma: f64,
    noise: Option<(Normal<f64>, StdRng)>,
}

impl Parabola3D {
    fn exact() -> Self {
        Parabola3D {
            sigma: 0.0,
            noise: None,
        }
    }

    fn noisy(sigma: f64, seed: u64) -> Self {
        Parabola3D {
            sigma,
            noise: Some((Normal::new(0.0, sigma).unwrap(), StdRng::seed_from_u64(seed))),
        }
    }

    fn sample(&mut self) -> f64 {
        match self.noise {
            Some((ref normal, ref mut rng)) => normal.sample(rng),
            None => 0.0,
        }
    }
}

impl NoisyFunction for Parabola3D {
    fn ndim(&self) -> usize {
        3
    }

    fn f(&mut self, x: ArrayView1<f64>) -> NoisyValue {
        let val = x[0].powi(2) + (x[1] + 1.0).powi(2) + (x[2] - 2.0).powi(2);
        NoisyValue::new(val + self.sample(), self.sigma)
    }
}

impl NoisyFunctionWithGradient for Parabola3D {
    fn has_grad_err(&self) -> bool {
        self.noise.is_some()
    }

    fn grad(&mut self, x: ArrayView1<f64>) -> Array1<NoisyValue> {
        let mut g = Array1::<NoisyValue>::default(3);
        for i in 0..3 {
            let gi = 2.0 * (x[i] - MINIMUM[i]) + self.sample();
            g[i] = NoisyValue::new(gi, self.sigma);
        }
        g
    }
}

fn assert_at_minimum(x: ArrayView1<f64>, epsilon: f64) {
    for (xi, mi) in x.iter().zip(MINIMUM.iter()) {
        assert_abs_diff_eq!(*xi, *mi, epsilon = epsilon);
    }
}

#[test]
fn sgd_without_momentum() {
    let mut target = Parabola3D::exact();
    let sgd = SgdBuilder::default().step_size(0.5).beta(0.0).build().unwrap();
    let mut min = NoisyMinimizer::new(sgd);
    let res = min.minimize(&mut target, aview1(&START)).unwrap();

    assert_at_minimum(res.x.view(), 0.01);
    assert_at_minimum(min.x().unwrap(), 0.01);
}

#[test]
fn sgd_ada_delta() {
    let mut target = Parabola3D::exact();
    let sgd = SgdBuilder::default()
        .step_size(0.1)
        .mode(SgdMode::AdaDelta)
        .build()
        .unwrap();
    let config = NfmConfigBuilder::default()
        .max_n_iterations(5000)
        .build()
        .unwrap();
    let mut min = NoisyMinimizer::new(sgd).with_config(config);
    let res = min.minimize(&mut target, aview1(&START)).unwrap();

    assert_at_minimum(res.x.view(), 1e-3);
}

#[test]
fn adam_with_noise_and_averaging() {
    for seed in 0..5 {
        let mut target = Parabola3D::noisy(0.25, seed);
        let adam = AdamBuilder::default()
            .alpha(0.1)
            .averaging(true)
            .build()
            .unwrap();
        let config = NfmConfigBuilder::default()
            .max_n_iterations(1000)
            .build()
            .unwrap();
        let mut min = NoisyMinimizer::new(adam).with_config(config);
        let res = min.minimize(&mut target, aview1(&START)).unwrap();

        // stabilized and averaged well before the cap
        assert!(min.n_iterations() > 100);
        assert!(min.n_iterations() < 1000);
        assert_at_minimum(res.x.view(), 0.1);
    }
}

#[test]
fn adam_with_noise_without_averaging() {
    let mut target = Parabola3D::noisy(0.25, 7);
    let adam = AdamBuilder::default().alpha(0.1).build().unwrap();
    let config = NfmConfigBuilder::default()
        .max_n_iterations(1000)
        .build()
        .unwrap();
    let mut min = NoisyMinimizer::new(adam).with_config(config);
    let res = min.minimize(&mut target, aview1(&START)).unwrap();

    assert!(min.n_iterations() < 1000);
    assert_at_minimum(res.x.view(), 0.5);
}

#[test]
fn conjugate_gradient_and_steepest_descent() {
    let mut target = Parabola3D::exact();
    let mut min = NoisyMinimizer::new(ConjGradBuilder::default().build().unwrap());
    let res = min.minimize(&mut target, aview1(&START)).unwrap();
    assert_at_minimum(res.x.view(), 1e-6);
    assert_abs_diff_eq!(min.f().unwrap().val, 0.0, epsilon = 1e-10);

    min.rule.configure_to_follow_simple_gradient();
    assert_eq!(min.rule.mode, ConjGradMode::SteepestDescent);
    let res = min.minimize(&mut target, aview1(&[-3.0, 0.0, 0.5])).unwrap();
    assert_at_minimum(res.x.view(), 1e-6);
}

#[test]
fn restarting_from_the_last_result() {
    let mut target = Parabola3D::exact();
    let sgd = SgdBuilder::default().step_size(0.1).beta(0.0).build().unwrap();
    let config = NfmConfigBuilder::default()
        .max_n_iterations(10)
        .build()
        .unwrap();
    let mut min = NoisyMinimizer::new(sgd).with_config(config);
    min.set_x(aview1(&START));

    // each step shrinks the distance to the minimum by 0.8
    let first = min.find_min(&mut target).unwrap();
    let second = min.find_min(&mut target).unwrap();
    assert_eq!(min.n_iterations(), 10);
    assert!(second.f < first.f);
    assert_abs_diff_eq!(second.x[0], 2.5 * 0.8f64.powi(20), epsilon = 1e-12);
}

#[test]
fn finite_difference_gradient() {
    let inner = WrappedFunction::new(3, |x: ArrayView1<f64>| {
        NoisyValue::exact(x[0].powi(2) + (x[1] + 1.0).powi(2) + (x[2] - 2.0).powi(2))
    });
    let mut target = NumericalGradient::new(inner, 1e-5);
    let config = NfmConfigBuilder::default()
        .max_n_iterations(100)
        .build()
        .unwrap();
    let cg = ConjGradBuilder::default().build().unwrap();
    let mut min = NoisyMinimizer::new(cg).with_config(config);
    let res = min.minimize(&mut target, aview1(&START)).unwrap();

    assert_at_minimum(res.x.view(), 1e-5);
    assert!(target.func.num > 0);
}
