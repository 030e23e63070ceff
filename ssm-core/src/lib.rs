//! Contracts for discrete time state space models,
//!
//!   x_{k+1} = f(x_k) + w_k,
//!   y_k     = g(x_k) + v_k,
//!
//! plus the Gaussian refinement and the one concrete model shipped,
//! `LinearGaussianModel`. Trajectory generation lives in `ssm-sampling`.

extern crate ndarray as nd;
extern crate ndarray_parallel as nd_par;
extern crate rayon;
extern crate linxal;
extern crate num_traits;
extern crate num_complex;
extern crate rand;

use nd::{ArrayView, ArrayViewMut, Axis, Ix1, Ix2, LinalgScalar};

use linxal::types::{LinxalImplScalar, LinxalScalar};
use linxal::eigenvalues::general::Eigen;
use linxal::eigenvalues::types::Solution;
use num_complex::Complex;
use num_traits::{Float, NumCast};

pub use error::{Result, Error, check_dim};
pub use noise::{NoiseSource, MultivariateNormal, ZeroNoise, SolutionHelper};
pub use linear::LinearGaussianModel;

pub mod error;
pub mod noise;
pub mod linear;

/// The capability set every model must supply. A type missing one of the
/// required operations does not implement the trait, so using it is a
/// compile error rather than a runtime failure.
///
/// Models are immutable values: `transition` and `emission` are pure
/// functions of the argument plus fixed parameters.
pub trait Model<E>: Send + Sync {
  fn state_dim(&self) -> usize;
  fn observation_dim(&self) -> usize;

  /// Noise-free next state.
  fn transition(&self, x: ArrayView<E, Ix1>,
                out: ArrayViewMut<E, Ix1>) -> Result<()>;
  /// Noise-free observation of `x`.
  fn emission(&self, x: ArrayView<E, Ix1>,
              out: ArrayViewMut<E, Ix1>) -> Result<()>;

  /// Columnwise `transition` over a batch of states. The default applies
  /// the single-state operation per column, so every model supports
  /// batches; matrix-operation models override this with one product.
  fn transition_batch(&self, x: ArrayView<E, Ix2>,
                      mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    check_dim("transition input batch size", x.dim().1,
              "transition output batch size", out.dim().1)?;
    for (x, out) in x.axis_iter(Axis(1)).zip(out.axis_iter_mut(Axis(1))) {
      self.transition(x, out)?;
    }
    Ok(())
  }

  fn emission_batch(&self, x: ArrayView<E, Ix2>,
                    mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    check_dim("emission input batch size", x.dim().1,
              "emission output batch size", out.dim().1)?;
    for (x, out) in x.axis_iter(Axis(1)).zip(out.axis_iter_mut(Axis(1))) {
      self.emission(x, out)?;
    }
    Ok(())
  }

  /// Process noise over R^state_dim. Called once per sampling call and
  /// reused across steps, so a costly construction is paid once.
  fn state_noise(&self) -> Result<Box<NoiseSource<E>>>;
  /// Measurement noise over R^observation_dim.
  fn observation_noise(&self) -> Result<Box<NoiseSource<E>>>;
}

/// Refinement for models whose noise is zero-mean Gaussian, parameterized
/// by covariance matrices. Implementers supply the covariances; the noise
/// sources are derived.
pub trait GaussianModel<E>: Model<E>
  where E: LinxalScalar<RealPart = E> + Float + NumCast + LinalgScalar + Eigen + Send + Sync,
        Solution<E, <E as LinxalImplScalar>::Complex>: SolutionHelper<E, Complex<E>>,
{
  /// Q, state_dim x state_dim, symmetric PSD.
  fn state_noise_cov(&self) -> ArrayView<E, Ix2>;
  /// R, observation_dim x observation_dim, symmetric PSD.
  fn observation_noise_cov(&self) -> ArrayView<E, Ix2>;

  fn state_noise_gen(&self) -> Result<MultivariateNormal<E>> {
    MultivariateNormal::new("state noise covariance",
                            self.state_noise_cov())
  }
  fn observation_noise_gen(&self) -> Result<MultivariateNormal<E>> {
    MultivariateNormal::new("observation noise covariance",
                            self.observation_noise_cov())
  }
}
