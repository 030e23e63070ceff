//! Noise sources driving the stochastic part of a model.

use nd::{Array, ArrayBase, ArrayView, ArrayViewMut, Axis, Ix1, Ix2,
         LinalgScalar};
use nd::linalg::{general_mat_mul, general_mat_vec_mul};
use nd_par::prelude::*;
use rayon::prelude::*;

use linxal::types::{LinxalImplScalar, LinxalScalar};
use linxal::eigenvalues::general::Eigen;
use linxal::eigenvalues::types::Solution;
use num_complex::Complex;
use num_traits::{Float, NumCast, One, Zero};

use rand::Rng;
use rand::distributions::IndependentSample;
use rand::distributions::normal::Normal;

use error::{Error, Result, check_dim};

/// A source of independent noise vectors of a fixed dimension.
///
/// Batched sampling draws one independent vector per column; it never
/// broadcasts a single draw across the batch.
pub trait NoiseSource<E> {
  fn dim(&self) -> usize;

  fn sample_into(&self, rand: &mut Rng,
                 out: ArrayViewMut<E, Ix1>) -> Result<()>;

  fn sample_batch_into(&self, rand: &mut Rng,
                       mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    for col in out.axis_iter_mut(Axis(1)) {
      self.sample_into(rand, col)?;
    }
    Ok(())
  }
}

pub trait SolutionHelper<EV, IV> {
  fn values_and_left_vectors(&mut self) -> (ArrayViewMut<IV, Ix1>, ArrayView<EV, Ix2>);
}

impl<T> SolutionHelper<T, Complex<<T as LinxalImplScalar>::RealPart>> for Solution<T, Complex<<T as LinxalImplScalar>::RealPart>>
  where T: Float + LinxalScalar,
{
  fn values_and_left_vectors(&mut self) -> (ArrayViewMut<Complex<<T as LinxalImplScalar>::RealPart>, Ix1>, ArrayView<T, Ix2>) {
    (self.values.view_mut(), self.left_vectors.as_ref().unwrap().view())
  }
}

/// Zero-mean multivariate Gaussian noise with a fixed covariance.
///
/// The covariance is validated and factorized once, at construction; every
/// draw is `transform * z` with `z` standard normal. The factorization is the
/// eigendecomposition square root, so singular and all-zero covariances
/// sample exactly.
#[derive(Clone, Debug)]
pub struct MultivariateNormal<E> {
  transform: Array<E, Ix2>,
}

impl<E> MultivariateNormal<E>
  where E: LinxalScalar<RealPart = E> + Float + NumCast + LinalgScalar + Eigen + Send + Sync,
        Solution<E, <E as LinxalImplScalar>::Complex>: SolutionHelper<E, Complex<E>>,
{
  /// `what` names the covariance in any validation error.
  pub fn new(what: &'static str, cov: ArrayView<E, Ix2>)
             -> Result<MultivariateNormal<E>>
  {
    let (rows, cols) = cov.dim();
    if rows != cols {
      return Err(Error::NotSquare { what: what, rows: rows, cols: cols });
    }
    if rows == 0 {
      return Err(Error::ZeroDimension { what: what });
    }

    let sym_tol: E = NumCast::from(1.0e-8).unwrap();
    for i in 0..rows {
      for j in (i + 1)..cols {
        let scale = cov[[i, j]].abs()
          .max(cov[[j, i]].abs())
          .max(One::one());
        if (cov[[i, j]] - cov[[j, i]]).abs() > sym_tol * scale {
          return Err(Error::NotSymmetric { what: what });
        }
      }
    }

    let mut sol = Eigen::compute_into(cov.to_owned(), true, false)?;
    let (values, vectors) = sol.values_and_left_vectors();

    let mut largest = E::zero();
    let d = values.map(|v| {
      if v.re.abs() > largest {
        largest = v.re.abs();
      }
      v.re
    });

    let psd_tol: E = NumCast::from(1.0e-9).unwrap();
    let floor = -(largest.max(One::one()) * psd_tol);
    if d.iter().any(|&v| v < floor) {
      return Err(Error::NotPositiveSemiDefinite { what: what });
    }
    // Roundoff can leave tiny negative eigenvalues on singular covariances.
    let d = d.mapv_into(|v| {
      if v < E::zero() {
        E::zero()
      } else {
        v.sqrt()
      }
    });

    let mut transform: Array<E, Ix2> = ArrayBase::zeros((rows, cols));
    transform.axis_iter_mut(Axis(1))
      .into_par_iter()
      .zip(vectors.axis_iter(Axis(1)).into_par_iter())
      .zip(d.axis_iter(Axis(0)).into_par_iter())
      .for_each(|((mut t, v), scale)| {
        t.assign(&v);
        t.mapv_inplace(|s| s * scale[()]);
      });

    Ok(MultivariateNormal {
      transform: transform,
    })
  }
}

impl<E> NoiseSource<E> for MultivariateNormal<E>
  where E: LinalgScalar + Float + NumCast,
{
  fn dim(&self) -> usize { self.transform.dim().0 }

  fn sample_into(&self, mut rand: &mut Rng,
                 mut out: ArrayViewMut<E, Ix1>) -> Result<()> {
    check_dim("noise output dimension", out.dim(),
              "noise source dimension", self.transform.dim().0)?;

    let normal = Normal::new(0.0, 1.0);
    let mut z: Array<E, Ix1> = ArrayBase::zeros(self.transform.dim().0);
    for i in 0..z.dim() {
      z[[i]] = NumCast::from(normal.ind_sample(&mut rand)).unwrap();
    }
    general_mat_vec_mul(One::one(), &self.transform, &z,
                        Zero::zero(), &mut out);
    Ok(())
  }

  fn sample_batch_into(&self, mut rand: &mut Rng,
                       mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    check_dim("noise output dimension", out.dim().0,
              "noise source dimension", self.transform.dim().0)?;

    let normal = Normal::new(0.0, 1.0);
    let mut z: Array<E, Ix2> = ArrayBase::zeros(out.dim());
    for i in 0..z.dim().0 {
      for j in 0..z.dim().1 {
        z[[i, j]] = NumCast::from(normal.ind_sample(&mut rand)).unwrap();
      }
    }
    general_mat_mul(One::one(), &self.transform, &z,
                    Zero::zero(), &mut out);
    Ok(())
  }
}

/// Always-zero noise. Turns sampling into the deterministic forward
/// iteration of the model.
#[derive(Clone, Copy, Debug)]
pub struct ZeroNoise {
  dim: usize,
}

impl ZeroNoise {
  pub fn new(dim: usize) -> ZeroNoise {
    ZeroNoise {
      dim: dim,
    }
  }
}

impl<E> NoiseSource<E> for ZeroNoise
  where E: LinalgScalar,
{
  fn dim(&self) -> usize { self.dim }

  fn sample_into(&self, _: &mut Rng,
                 mut out: ArrayViewMut<E, Ix1>) -> Result<()> {
    check_dim("noise output dimension", out.dim(),
              "noise source dimension", self.dim)?;
    out.fill(Zero::zero());
    Ok(())
  }

  fn sample_batch_into(&self, _: &mut Rng,
                       mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    check_dim("noise output dimension", out.dim().0,
              "noise source dimension", self.dim)?;
    out.fill(Zero::zero());
    Ok(())
  }
}
