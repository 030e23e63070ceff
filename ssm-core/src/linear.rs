//! The shipped concrete model: linear transition and emission operators
//! with Gaussian noise.

use nd::{Array, ArrayView, ArrayViewMut, Ix1, Ix2, LinalgScalar};
use nd::linalg::{general_mat_mul, general_mat_vec_mul};

use linxal::types::{LinxalImplScalar, LinxalScalar};
use linxal::eigenvalues::general::Eigen;
use linxal::eigenvalues::types::Solution;
use num_complex::Complex;
use num_traits::{Float, NumCast, One, Zero};

use {Model, GaussianModel};
use error::{Error, Result, check_dim};
use noise::{MultivariateNormal, NoiseSource, SolutionHelper};

/// x' = F x + w, y = H x + v, with w ~ N(0, Q) and v ~ N(0, R).
///
/// All four matrices are validated at construction: F square, H conformant
/// with F, Q and R square/symmetric/PSD of the matching dimension. The two
/// noise sources are factorized here, once, and handed out as copies.
#[derive(Clone, Debug)]
pub struct LinearGaussianModel<E> {
  transition_operator: Array<E, Ix2>,
  state_cov: Array<E, Ix2>,
  observation_operator: Array<E, Ix2>,
  observation_cov: Array<E, Ix2>,

  state_noise: MultivariateNormal<E>,
  observation_noise: MultivariateNormal<E>,
}

impl<E> LinearGaussianModel<E>
  where E: LinxalScalar<RealPart = E> + Float + NumCast + LinalgScalar + Eigen + Send + Sync,
        Solution<E, <E as LinxalImplScalar>::Complex>: SolutionHelper<E, Complex<E>>,
{
  pub fn new(f: Array<E, Ix2>, q: Array<E, Ix2>,
             h: Array<E, Ix2>, r: Array<E, Ix2>)
             -> Result<LinearGaussianModel<E>>
  {
    let (n, n2) = f.dim();
    if n != n2 {
      return Err(Error::NotSquare {
        what: "transition matrix",
        rows: n,
        cols: n2,
      });
    }
    if n == 0 {
      return Err(Error::ZeroDimension { what: "state dimension" });
    }
    let (m, hn) = h.dim();
    if m == 0 {
      return Err(Error::ZeroDimension { what: "observation dimension" });
    }
    check_dim("observation matrix columns", hn,
              "state dimension", n)?;
    check_dim("state noise covariance rows", q.dim().0,
              "state dimension", n)?;
    check_dim("state noise covariance columns", q.dim().1,
              "state dimension", n)?;
    check_dim("observation noise covariance rows", r.dim().0,
              "observation dimension", m)?;
    check_dim("observation noise covariance columns", r.dim().1,
              "observation dimension", m)?;

    let state_noise =
      MultivariateNormal::new("state noise covariance", q.view())?;
    let observation_noise =
      MultivariateNormal::new("observation noise covariance", r.view())?;

    Ok(LinearGaussianModel {
      transition_operator: f,
      state_cov: q,
      observation_operator: h,
      observation_cov: r,
      state_noise: state_noise,
      observation_noise: observation_noise,
    })
  }

  /// Coerce matrices of a foreign element type into `E`, then construct.
  pub fn cast_new<F2>(f: Array<F2, Ix2>, q: Array<F2, Ix2>,
                      h: Array<F2, Ix2>, r: Array<F2, Ix2>)
                      -> Result<LinearGaussianModel<E>>
    where F2: NumCast + Copy,
  {
    fn cast<F2, E>(what: &'static str, a: Array<F2, Ix2>)
                   -> Result<Array<E, Ix2>>
      where F2: NumCast + Copy,
            E: NumCast + Zero,
    {
      let mut ok = true;
      let b = a.map(|&v| match NumCast::from(v) {
        Some(v) => v,
        None => {
          ok = false;
          Zero::zero()
        },
      });
      if ok {
        Ok(b)
      } else {
        Err(Error::UnrepresentableElement { what: what })
      }
    }

    LinearGaussianModel::new(cast("transition matrix", f)?,
                             cast("state noise covariance", q)?,
                             cast("observation matrix", h)?,
                             cast("observation noise covariance", r)?)
  }

  pub fn transition_matrix(&self) -> ArrayView<E, Ix2> {
    self.transition_operator.view()
  }
  pub fn observation_matrix(&self) -> ArrayView<E, Ix2> {
    self.observation_operator.view()
  }
}

impl<E> Model<E> for LinearGaussianModel<E>
  where E: LinalgScalar + Float + NumCast + Send + Sync,
{
  fn state_dim(&self) -> usize { self.transition_operator.dim().0 }
  fn observation_dim(&self) -> usize { self.observation_operator.dim().0 }

  fn transition(&self, x: ArrayView<E, Ix1>,
                mut out: ArrayViewMut<E, Ix1>) -> Result<()> {
    check_dim("transition input dimension", x.dim(),
              "state dimension", self.state_dim())?;
    check_dim("transition output dimension", out.dim(),
              "state dimension", self.state_dim())?;
    general_mat_vec_mul(One::one(), &self.transition_operator, &x,
                        Zero::zero(), &mut out);
    Ok(())
  }

  fn emission(&self, x: ArrayView<E, Ix1>,
              mut out: ArrayViewMut<E, Ix1>) -> Result<()> {
    check_dim("emission input dimension", x.dim(),
              "state dimension", self.state_dim())?;
    check_dim("emission output dimension", out.dim(),
              "observation dimension", self.observation_dim())?;
    general_mat_vec_mul(One::one(), &self.observation_operator, &x,
                        Zero::zero(), &mut out);
    Ok(())
  }

  // Whole-batch matrix products instead of the columnwise defaults.
  fn transition_batch(&self, x: ArrayView<E, Ix2>,
                      mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    check_dim("transition input dimension", x.dim().0,
              "state dimension", self.state_dim())?;
    check_dim("transition output dimension", out.dim().0,
              "state dimension", self.state_dim())?;
    check_dim("transition input batch size", x.dim().1,
              "transition output batch size", out.dim().1)?;
    general_mat_mul(One::one(), &self.transition_operator, &x,
                    Zero::zero(), &mut out);
    Ok(())
  }

  fn emission_batch(&self, x: ArrayView<E, Ix2>,
                    mut out: ArrayViewMut<E, Ix2>) -> Result<()> {
    check_dim("emission input dimension", x.dim().0,
              "state dimension", self.state_dim())?;
    check_dim("emission output dimension", out.dim().0,
              "observation dimension", self.observation_dim())?;
    check_dim("emission input batch size", x.dim().1,
              "emission output batch size", out.dim().1)?;
    general_mat_mul(One::one(), &self.observation_operator, &x,
                    Zero::zero(), &mut out);
    Ok(())
  }

  fn state_noise(&self) -> Result<Box<NoiseSource<E>>> {
    Ok(Box::new(self.state_noise.clone()))
  }
  fn observation_noise(&self) -> Result<Box<NoiseSource<E>>> {
    Ok(Box::new(self.observation_noise.clone()))
  }
}

impl<E> GaussianModel<E> for LinearGaussianModel<E>
  where E: LinxalScalar<RealPart = E> + Float + NumCast + LinalgScalar + Eigen + Send + Sync,
        Solution<E, <E as LinxalImplScalar>::Complex>: SolutionHelper<E, Complex<E>>,
{
  fn state_noise_cov(&self) -> ArrayView<E, Ix2> {
    self.state_cov.view()
  }
  fn observation_noise_cov(&self) -> ArrayView<E, Ix2> {
    self.observation_cov.view()
  }
}
