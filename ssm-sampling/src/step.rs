//! Single combined advancement steps.
//!
//! A combined step first advances the state, then emits from the *new*
//! state; the two noise draws are independent.

use nd::{Array, ArrayBase, ArrayView, ArrayViewMut, Ix1, Ix2, LinalgScalar};
use rand::Rng;
use std::ops::AddAssign;

use ssm_core::{Model, NoiseSource, Result, check_dim};

/// out = transition(x) + w.
pub fn advance_state_into<E, M>(model: &M,
                                noise: &NoiseSource<E>,
                                rand: &mut Rng,
                                x: ArrayView<E, Ix1>,
                                mut out: ArrayViewMut<E, Ix1>)
                                -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("current state dimension", x.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("state output dimension", out.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("state noise dimension", noise.dim(),
            "model state dimension", model.state_dim())?;

  model.transition(x, out.view_mut())?;
  let mut w: Array<E, Ix1> = ArrayBase::zeros(model.state_dim());
  noise.sample_into(rand, w.view_mut())?;
  out += &w;
  Ok(())
}

/// out = emission(x) + v.
pub fn observe_into<E, M>(model: &M,
                          noise: &NoiseSource<E>,
                          rand: &mut Rng,
                          x: ArrayView<E, Ix1>,
                          mut out: ArrayViewMut<E, Ix1>)
                          -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("current state dimension", x.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("observation output dimension", out.dim(),
            "model observation dimension", model.observation_dim())?;
  check_dim("observation noise dimension", noise.dim(),
            "model observation dimension", model.observation_dim())?;

  model.emission(x, out.view_mut())?;
  let mut v: Array<E, Ix1> = ArrayBase::zeros(model.observation_dim());
  noise.sample_into(rand, v.view_mut())?;
  out += &v;
  Ok(())
}

pub fn step_into<E, M>(model: &M,
                       state_noise: &NoiseSource<E>,
                       observation_noise: &NoiseSource<E>,
                       rand: &mut Rng,
                       x: ArrayView<E, Ix1>,
                       mut x_next: ArrayViewMut<E, Ix1>,
                       y_next: ArrayViewMut<E, Ix1>)
                       -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  advance_state_into(model, state_noise, rand, x, x_next.view_mut())?;
  observe_into(model, observation_noise, rand, x_next.view(), y_next)
}

/// Columnwise `advance_state_into` over a batch. One independent draw per
/// batch member.
pub fn advance_state_batch_into<E, M>(model: &M,
                                      noise: &NoiseSource<E>,
                                      rand: &mut Rng,
                                      x: ArrayView<E, Ix2>,
                                      mut out: ArrayViewMut<E, Ix2>)
                                      -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("current state dimension", x.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("state output dimension", out.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("current state batch size", x.dim().1,
            "state output batch size", out.dim().1)?;
  check_dim("state noise dimension", noise.dim(),
            "model state dimension", model.state_dim())?;

  model.transition_batch(x, out.view_mut())?;
  let mut w: Array<E, Ix2> = ArrayBase::zeros(out.dim());
  noise.sample_batch_into(rand, w.view_mut())?;
  out += &w;
  Ok(())
}

pub fn observe_batch_into<E, M>(model: &M,
                                noise: &NoiseSource<E>,
                                rand: &mut Rng,
                                x: ArrayView<E, Ix2>,
                                mut out: ArrayViewMut<E, Ix2>)
                                -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("current state dimension", x.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("observation output dimension", out.dim().0,
            "model observation dimension", model.observation_dim())?;
  check_dim("current state batch size", x.dim().1,
            "observation output batch size", out.dim().1)?;
  check_dim("observation noise dimension", noise.dim(),
            "model observation dimension", model.observation_dim())?;

  model.emission_batch(x, out.view_mut())?;
  let mut v: Array<E, Ix2> = ArrayBase::zeros(out.dim());
  noise.sample_batch_into(rand, v.view_mut())?;
  out += &v;
  Ok(())
}

pub fn step_batch_into<E, M>(model: &M,
                             state_noise: &NoiseSource<E>,
                             observation_noise: &NoiseSource<E>,
                             rand: &mut Rng,
                             x: ArrayView<E, Ix2>,
                             mut x_next: ArrayViewMut<E, Ix2>,
                             y_next: ArrayViewMut<E, Ix2>)
                             -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  advance_state_batch_into(model, state_noise, rand, x, x_next.view_mut())?;
  observe_batch_into(model, observation_noise, rand, x_next.view(), y_next)
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::{arr1, arr2, Array};
  use rand::SeedableRng;
  use ssm_core::{Error, LinearGaussianModel, ZeroNoise};

  const RNG_SEED: [u64; 1] = [3];

  fn shift_model() -> LinearGaussianModel<f64> {
    LinearGaussianModel::new(
      arr2(&[[1.0, 0.25], [0.0, 1.0]]),
      Array::zeros((2, 2)),
      arr2(&[[1.0, 0.0]]),
      Array::zeros((1, 1)),
    ).expect("valid model")
  }

  #[test]
  fn combined_step_emits_from_new_state() {
    let mut rand = ::rand::Isaac64Rng::from_seed(&RNG_SEED[..]);
    let model = shift_model();
    let state_noise = ZeroNoise::new(2);
    let observation_noise = ZeroNoise::new(1);

    let x = arr1(&[1.0, 2.0]);
    let mut x_next = Array::zeros(2);
    let mut y_next = Array::zeros(1);
    step_into(&model, &state_noise, &observation_noise, &mut rand,
              x.view(), x_next.view_mut(), y_next.view_mut())
      .unwrap();

    assert_eq!(x_next, arr1(&[1.5, 2.0]));
    // Emission of the advanced state, not the argument.
    assert_eq!(y_next, arr1(&[1.5]));
  }

  #[test]
  fn batch_step_advances_each_column() {
    let mut rand = ::rand::Isaac64Rng::from_seed(&RNG_SEED[..]);
    let model = shift_model();
    let state_noise = ZeroNoise::new(2);
    let observation_noise = ZeroNoise::new(1);

    let x = arr2(&[
      [1.0, -2.0],
      [2.0, 4.0],
    ]);
    let mut x_next = Array::zeros((2, 2));
    let mut y_next = Array::zeros((1, 2));
    step_batch_into(&model, &state_noise, &observation_noise, &mut rand,
                    x.view(), x_next.view_mut(), y_next.view_mut())
      .unwrap();

    assert_eq!(x_next, arr2(&[
      [1.5, -1.0],
      [2.0, 4.0],
    ]));
    assert_eq!(y_next, arr2(&[[1.5, -1.0]]));
  }

  #[test]
  fn rejects_wrong_state_dimension() {
    let mut rand = ::rand::Isaac64Rng::from_seed(&RNG_SEED[..]);
    let model = shift_model();
    let noise = ZeroNoise::new(2);

    let x = arr1(&[1.0, 2.0, 3.0]);
    let mut out = Array::zeros(2);
    match advance_state_into(&model, &noise, &mut rand,
                             x.view(), out.view_mut()) {
      Err(Error::DimensionMismatch { left_dim: 3, right_dim: 2, .. }) => {},
      other => panic!("expected DimensionMismatch, got {:?}", other),
    }
  }

  #[test]
  fn rejects_wrong_noise_dimension() {
    let mut rand = ::rand::Isaac64Rng::from_seed(&RNG_SEED[..]);
    let model = shift_model();
    let noise = ZeroNoise::new(1);

    let x = arr1(&[1.0, 2.0]);
    let mut out = Array::zeros(2);
    match advance_state_into(&model, &noise, &mut rand,
                             x.view(), out.view_mut()) {
      Err(Error::DimensionMismatch { left_dim: 1, right_dim: 2, .. }) => {},
      other => panic!("expected DimensionMismatch, got {:?}", other),
    }
  }
}
