//! Full trajectory generation.
//!
//! Layout convention: time is the trailing axis. A single run is
//! state_dim x (T+1); a batch of N runs is state_dim x N x (T+1). Index 0
//! holds the supplied initial state and the observation emitted from it.
//!
//! Single and batched sampling are separate, explicitly named operations;
//! there is no rank inference.

use nd::{Array, ArrayBase, ArrayView, ArrayViewMut, Axis, Ix1, Ix2, Ix3,
         LinalgScalar};
use num_traits::NumCast;
use rand::Rng;
use std::mem;
use std::ops::AddAssign;

use ssm_core::{Model, NoiseSource, Error, Result, check_dim};

use step::{advance_state_into, observe_into,
           advance_state_batch_into, observe_batch_into};

/// One sampled run: states and observations over T+1 time columns.
#[derive(Clone, Debug)]
pub struct Trajectory<E> {
  pub states: Array<E, Ix2>,
  pub observations: Array<E, Ix2>,
}

/// N independent runs advanced in lockstep.
#[derive(Clone, Debug)]
pub struct BatchTrajectory<E> {
  pub states: Array<E, Ix3>,
  pub observations: Array<E, Ix3>,
}

/// Time indices 0..len, for plotting against trajectory columns.
pub fn time_index<E>(len: usize) -> Array<E, Ix1>
  where E: NumCast + Clone,
{
  ArrayBase::from_iter((0..len).map(|i| {
    NumCast::from(i).expect("time index not representable")
  }))
}

/// Fill `states` and `observations` in place with one run from `x0`.
///
/// The noise sources are reused across every step. All dimensions are
/// validated before the first write; on error the buffers hold no usable
/// partial result.
pub fn sample_trajectory_with_noise<E, M>(model: &M,
                                          state_noise: &NoiseSource<E>,
                                          observation_noise: &NoiseSource<E>,
                                          rand: &mut Rng,
                                          x0: ArrayView<E, Ix1>,
                                          mut states: ArrayViewMut<E, Ix2>,
                                          mut observations: ArrayViewMut<E, Ix2>)
                                          -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("initial state dimension", x0.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("state output dimension", states.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("observation output dimension", observations.dim().0,
            "model observation dimension", model.observation_dim())?;
  check_dim("state output time steps", states.dim().1,
            "observation output time steps", observations.dim().1)?;
  check_dim("state noise dimension", state_noise.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("observation noise dimension", observation_noise.dim(),
            "model observation dimension", model.observation_dim())?;

  let time_len = states.dim().1;
  if time_len == 0 {
    return Err(Error::ZeroDimension { what: "trajectory time axis" });
  }

  states.column_mut(0).assign(&x0);
  observe_into(model, observation_noise, rand, x0,
               observations.column_mut(0))?;

  for t in 1..time_len {
    let view = states.view_mut();
    let (prev, mut cur) = view.split_at(Axis(1), t);
    let mut x_t = cur.column_mut(0);
    advance_state_into(model, state_noise, rand,
                       prev.column(t - 1), x_t.view_mut())?;
    observe_into(model, observation_noise, rand,
                 x_t.view(), observations.column_mut(t))?;
  }

  Ok(())
}

/// Single-container overload: only observations are retained; states live
/// in a scratch pair and are discarded.
pub fn sample_observations_with_noise<E, M>(model: &M,
                                            state_noise: &NoiseSource<E>,
                                            observation_noise: &NoiseSource<E>,
                                            rand: &mut Rng,
                                            x0: ArrayView<E, Ix1>,
                                            mut observations: ArrayViewMut<E, Ix2>)
                                            -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("initial state dimension", x0.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("observation output dimension", observations.dim().0,
            "model observation dimension", model.observation_dim())?;
  check_dim("state noise dimension", state_noise.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("observation noise dimension", observation_noise.dim(),
            "model observation dimension", model.observation_dim())?;

  let time_len = observations.dim().1;
  if time_len == 0 {
    return Err(Error::ZeroDimension { what: "trajectory time axis" });
  }

  let mut prev = x0.to_owned();
  let mut cur: Array<E, Ix1> = ArrayBase::zeros(model.state_dim());

  observe_into(model, observation_noise, rand, prev.view(),
               observations.column_mut(0))?;
  for t in 1..time_len {
    advance_state_into(model, state_noise, rand,
                       prev.view(), cur.view_mut())?;
    observe_into(model, observation_noise, rand,
                 cur.view(), observations.column_mut(t))?;
    mem::swap(&mut prev, &mut cur);
  }

  Ok(())
}

/// Batched in-place form. `x0` columns are independent batch members; the
/// state output container is the batch-size reference the other containers
/// are checked against.
pub fn sample_batch_trajectory_with_noise<E, M>(model: &M,
                                                state_noise: &NoiseSource<E>,
                                                observation_noise: &NoiseSource<E>,
                                                rand: &mut Rng,
                                                x0: ArrayView<E, Ix2>,
                                                mut states: ArrayViewMut<E, Ix3>,
                                                mut observations: ArrayViewMut<E, Ix3>)
                                                -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("initial state dimension", x0.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("state output dimension", states.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("observation output dimension", observations.dim().0,
            "model observation dimension", model.observation_dim())?;
  check_dim("initial state batch size", x0.dim().1,
            "state output batch size", states.dim().1)?;
  check_dim("state output batch size", states.dim().1,
            "observation output batch size", observations.dim().1)?;
  check_dim("state output time steps", states.dim().2,
            "observation output time steps", observations.dim().2)?;
  check_dim("state noise dimension", state_noise.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("observation noise dimension", observation_noise.dim(),
            "model observation dimension", model.observation_dim())?;

  let time_len = states.dim().2;
  if time_len == 0 {
    return Err(Error::ZeroDimension { what: "trajectory time axis" });
  }

  states.subview_mut(Axis(2), 0).assign(&x0);
  observe_batch_into(model, observation_noise, rand, x0,
                     observations.subview_mut(Axis(2), 0))?;

  for t in 1..time_len {
    let view = states.view_mut();
    let (prev, mut cur) = view.split_at(Axis(2), t);
    let mut x_t = cur.subview_mut(Axis(2), 0);
    advance_state_batch_into(model, state_noise, rand,
                             prev.subview(Axis(2), t - 1), x_t.view_mut())?;
    observe_batch_into(model, observation_noise, rand,
                       x_t.view(), observations.subview_mut(Axis(2), t))?;
  }

  Ok(())
}

pub fn sample_batch_observations_with_noise<E, M>(model: &M,
                                                  state_noise: &NoiseSource<E>,
                                                  observation_noise: &NoiseSource<E>,
                                                  rand: &mut Rng,
                                                  x0: ArrayView<E, Ix2>,
                                                  mut observations: ArrayViewMut<E, Ix3>)
                                                  -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  check_dim("initial state dimension", x0.dim().0,
            "model state dimension", model.state_dim())?;
  check_dim("observation output dimension", observations.dim().0,
            "model observation dimension", model.observation_dim())?;
  check_dim("initial state batch size", x0.dim().1,
            "observation output batch size", observations.dim().1)?;
  check_dim("state noise dimension", state_noise.dim(),
            "model state dimension", model.state_dim())?;
  check_dim("observation noise dimension", observation_noise.dim(),
            "model observation dimension", model.observation_dim())?;

  let time_len = observations.dim().2;
  if time_len == 0 {
    return Err(Error::ZeroDimension { what: "trajectory time axis" });
  }

  let mut prev = x0.to_owned();
  let mut cur: Array<E, Ix2> = ArrayBase::zeros(x0.dim());

  observe_batch_into(model, observation_noise, rand, prev.view(),
                     observations.subview_mut(Axis(2), 0))?;
  for t in 1..time_len {
    advance_state_batch_into(model, state_noise, rand,
                             prev.view(), cur.view_mut())?;
    observe_batch_into(model, observation_noise, rand,
                       cur.view(), observations.subview_mut(Axis(2), t))?;
    mem::swap(&mut prev, &mut cur);
  }

  Ok(())
}

/// As `sample_trajectory_with_noise`, with both noise sources constructed
/// from the model, once, and reused across steps.
pub fn sample_trajectory_into<E, M>(model: &M,
                                    rand: &mut Rng,
                                    x0: ArrayView<E, Ix1>,
                                    states: ArrayViewMut<E, Ix2>,
                                    observations: ArrayViewMut<E, Ix2>)
                                    -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let state_noise = model.state_noise()?;
  let observation_noise = model.observation_noise()?;
  sample_trajectory_with_noise(model, &*state_noise, &*observation_noise,
                               rand, x0, states, observations)
}

pub fn sample_observations_into<E, M>(model: &M,
                                      rand: &mut Rng,
                                      x0: ArrayView<E, Ix1>,
                                      observations: ArrayViewMut<E, Ix2>)
                                      -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let state_noise = model.state_noise()?;
  let observation_noise = model.observation_noise()?;
  sample_observations_with_noise(model, &*state_noise, &*observation_noise,
                                 rand, x0, observations)
}

pub fn sample_batch_trajectory_into<E, M>(model: &M,
                                          rand: &mut Rng,
                                          x0: ArrayView<E, Ix2>,
                                          states: ArrayViewMut<E, Ix3>,
                                          observations: ArrayViewMut<E, Ix3>)
                                          -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let state_noise = model.state_noise()?;
  let observation_noise = model.observation_noise()?;
  sample_batch_trajectory_with_noise(model, &*state_noise, &*observation_noise,
                                     rand, x0, states, observations)
}

pub fn sample_batch_observations_into<E, M>(model: &M,
                                            rand: &mut Rng,
                                            x0: ArrayView<E, Ix2>,
                                            observations: ArrayViewMut<E, Ix3>)
                                            -> Result<()>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let state_noise = model.state_noise()?;
  let observation_noise = model.observation_noise()?;
  sample_batch_observations_with_noise(model, &*state_noise, &*observation_noise,
                                       rand, x0, observations)
}

/// Allocate containers for `steps` additional steps (plus the initial
/// column; `steps == 0` still yields one column) and sample into them.
pub fn sample_trajectory<E, M>(model: &M,
                               rand: &mut Rng,
                               x0: ArrayView<E, Ix1>,
                               steps: usize)
                               -> Result<Trajectory<E>>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let mut states: Array<E, Ix2> =
    ArrayBase::zeros((model.state_dim(), steps + 1));
  let mut observations: Array<E, Ix2> =
    ArrayBase::zeros((model.observation_dim(), steps + 1));
  sample_trajectory_into(model, rand, x0,
                         states.view_mut(), observations.view_mut())?;
  Ok(Trajectory {
    states: states,
    observations: observations,
  })
}

pub fn sample_observations<E, M>(model: &M,
                                 rand: &mut Rng,
                                 x0: ArrayView<E, Ix1>,
                                 steps: usize)
                                 -> Result<Array<E, Ix2>>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let mut observations: Array<E, Ix2> =
    ArrayBase::zeros((model.observation_dim(), steps + 1));
  sample_observations_into(model, rand, x0, observations.view_mut())?;
  Ok(observations)
}

pub fn sample_batch_trajectory<E, M>(model: &M,
                                     rand: &mut Rng,
                                     x0: ArrayView<E, Ix2>,
                                     steps: usize)
                                     -> Result<BatchTrajectory<E>>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let batch = x0.dim().1;
  let mut states: Array<E, Ix3> =
    ArrayBase::zeros((model.state_dim(), batch, steps + 1));
  let mut observations: Array<E, Ix3> =
    ArrayBase::zeros((model.observation_dim(), batch, steps + 1));
  sample_batch_trajectory_into(model, rand, x0,
                               states.view_mut(), observations.view_mut())?;
  Ok(BatchTrajectory {
    states: states,
    observations: observations,
  })
}

pub fn sample_batch_observations<E, M>(model: &M,
                                       rand: &mut Rng,
                                       x0: ArrayView<E, Ix2>,
                                       steps: usize)
                                       -> Result<Array<E, Ix3>>
  where E: LinalgScalar + AddAssign<E>,
        M: Model<E>,
{
  let batch = x0.dim().1;
  let mut observations: Array<E, Ix3> =
    ArrayBase::zeros((model.observation_dim(), batch, steps + 1));
  sample_batch_observations_into(model, rand, x0, observations.view_mut())?;
  Ok(observations)
}

#[cfg(test)]
mod test {
  use super::*;
  use nd::{arr1, arr2, Array};
  use rand::SeedableRng;
  use ssm_core::{Error, LinearGaussianModel, NoiseSource, Result,
                 ZeroNoise, check_dim};

  const RNG_SEED: [u64; 1] = [11];

  fn rng() -> ::rand::Isaac64Rng {
    ::rand::Isaac64Rng::from_seed(&RNG_SEED[..])
  }

  fn constant_accel() -> LinearGaussianModel<f64> {
    LinearGaussianModel::new(
      arr2(&[
        [1.0, 1.0, 0.5],
        [0.0, 1.0, 1.0],
        [0.0, 0.0, 1.0],
      ]),
      Array::zeros((3, 3)),
      arr2(&[[1.0, 0.0, 0.0]]),
      Array::zeros((1, 1)),
    ).expect("valid model")
  }

  fn noisy_model() -> LinearGaussianModel<f64> {
    LinearGaussianModel::new(
      arr2(&[[1.0, 0.25], [0.0, 1.0]]),
      arr2(&[[0.5, 0.0], [0.0, 0.25]]),
      arr2(&[[1.0, 0.0]]),
      arr2(&[[0.125]]),
    ).expect("valid model")
  }

  /// Fixed additive offset; lets batch and single runs share one noise
  /// sequence exactly.
  struct ConstNoise {
    value: Array<f64, ::nd::Ix1>,
  }
  impl NoiseSource<f64> for ConstNoise {
    fn dim(&self) -> usize { self.value.dim() }
    fn sample_into(&self, _: &mut ::rand::Rng,
                   mut out: ::nd::ArrayViewMut<f64, ::nd::Ix1>)
                   -> Result<()> {
      check_dim("noise output dimension", out.dim(),
                "noise source dimension", self.value.dim())?;
      out.assign(&self.value);
      Ok(())
    }
  }

  #[test]
  fn constant_acceleration_scenario() {
    let model = constant_accel();
    let x0 = arr1(&[0.0, 0.0, 1.0]);
    let run = sample_trajectory(&model, &mut rng(), x0.view(), 2).unwrap();

    assert_eq!(run.states, arr2(&[
      [0.0, 0.5, 2.0],
      [0.0, 1.0, 2.0],
      [1.0, 1.0, 1.0],
    ]));
    assert_eq!(run.observations, arr2(&[[0.0, 0.5, 2.0]]));
  }

  #[test]
  fn identity_model_holds_state() {
    let model = LinearGaussianModel::new(
      arr2(&[[1.0]]),
      Array::zeros((1, 1)),
      arr2(&[[1.0]]),
      Array::zeros((1, 1)),
    ).unwrap();
    let x0 = arr1(&[5.0]);
    let run = sample_trajectory(&model, &mut rng(), x0.view(), 3).unwrap();

    assert_eq!(run.states, arr2(&[[5.0, 5.0, 5.0, 5.0]]));
    assert_eq!(run.observations, arr2(&[[5.0, 5.0, 5.0, 5.0]]));
  }

  #[test]
  fn zero_steps_still_writes_initial_column() {
    let model = constant_accel();
    let x0 = arr1(&[0.0, 0.0, 1.0]);
    let run = sample_trajectory(&model, &mut rng(), x0.view(), 0).unwrap();

    assert_eq!(run.states.dim(), (3, 1));
    assert_eq!(run.states, arr2(&[[0.0], [0.0], [1.0]]));
    assert_eq!(run.observations, arr2(&[[0.0]]));
  }

  #[test]
  fn seeded_runs_are_identical() {
    let model = noisy_model();
    let x0 = arr1(&[1.0, -1.0]);

    let a = sample_trajectory(&model, &mut rng(), x0.view(), 25).unwrap();
    let b = sample_trajectory(&model, &mut rng(), x0.view(), 25).unwrap();

    assert_eq!(a.states, b.states);
    assert_eq!(a.observations, b.observations);
  }

  #[test]
  fn observations_match_full_run() {
    let model = noisy_model();
    let x0 = arr1(&[1.0, -1.0]);

    let full = sample_trajectory(&model, &mut rng(), x0.view(), 10).unwrap();
    let obs_only = sample_observations(&model, &mut rng(), x0.view(), 10)
      .unwrap();

    assert_eq!(full.observations, obs_only);
  }

  #[test]
  fn batch_member_matches_single_run() {
    let model = LinearGaussianModel::new(
      arr2(&[[1.0, 0.25], [0.0, 1.0]]),
      Array::zeros((2, 2)),
      arr2(&[[1.0, -0.5]]),
      Array::zeros((1, 1)),
    ).unwrap();
    let state_noise = ConstNoise { value: arr1(&[0.125, -0.25]) };
    let observation_noise = ConstNoise { value: arr1(&[0.5]) };

    let x0s = arr2(&[
      [1.0, 0.5],
      [2.0, -1.0],
    ]);
    let mut batch_states = Array::zeros((2, 2, 5));
    let mut batch_obs = Array::zeros((1, 2, 5));
    sample_batch_trajectory_with_noise(&model, &state_noise,
                                       &observation_noise, &mut rng(),
                                       x0s.view(),
                                       batch_states.view_mut(),
                                       batch_obs.view_mut())
      .unwrap();

    for i in 0..2 {
      let mut states = Array::zeros((2, 5));
      let mut observations = Array::zeros((1, 5));
      sample_trajectory_with_noise(&model, &state_noise,
                                   &observation_noise, &mut rng(),
                                   x0s.column(i),
                                   states.view_mut(),
                                   observations.view_mut())
        .unwrap();

      assert_eq!(states.view(), batch_states.subview(Axis(1), i));
      assert_eq!(observations.view(), batch_obs.subview(Axis(1), i));
    }
  }

  /// Model without batch overrides: the columnwise defaults must give
  /// batch support for free.
  struct Decay;
  impl ::ssm_core::Model<f64> for Decay {
    fn state_dim(&self) -> usize { 1 }
    fn observation_dim(&self) -> usize { 1 }
    fn transition(&self, x: ::nd::ArrayView<f64, ::nd::Ix1>,
                  mut out: ::nd::ArrayViewMut<f64, ::nd::Ix1>)
                  -> Result<()> {
      out[[0]] = 0.5 * x[[0]];
      Ok(())
    }
    fn emission(&self, x: ::nd::ArrayView<f64, ::nd::Ix1>,
                mut out: ::nd::ArrayViewMut<f64, ::nd::Ix1>)
                -> Result<()> {
      out[[0]] = -x[[0]];
      Ok(())
    }
    fn state_noise(&self) -> Result<Box<NoiseSource<f64>>> {
      Ok(Box::new(ZeroNoise::new(1)))
    }
    fn observation_noise(&self) -> Result<Box<NoiseSource<f64>>> {
      Ok(Box::new(ZeroNoise::new(1)))
    }
  }

  #[test]
  fn default_batch_ops_match_single_runs() {
    let x0s = arr2(&[[8.0, -4.0, 2.0]]);
    let batch = sample_batch_trajectory(&Decay, &mut rng(), x0s.view(), 3)
      .unwrap();

    for i in 0..3 {
      let single = sample_trajectory(&Decay, &mut rng(),
                                     x0s.column(i), 3).unwrap();
      assert_eq!(single.states.view(), batch.states.subview(Axis(1), i));
      assert_eq!(single.observations.view(),
                 batch.observations.subview(Axis(1), i));
    }
    assert_eq!(batch.states.subview(Axis(1), 0),
               arr2(&[[8.0, 4.0, 2.0, 1.0]]));
    assert_eq!(batch.observations.subview(Axis(1), 0),
               arr2(&[[-8.0, -4.0, -2.0, -1.0]]));
  }

  #[test]
  fn rejects_initial_state_mismatch_without_writing() {
    let model = constant_accel();
    let x0 = arr1(&[0.0, 0.0]);
    let mut states = Array::from_elem((3, 4), 7.0);
    let mut observations = Array::from_elem((1, 4), 7.0);

    match sample_trajectory_into(&model, &mut rng(), x0.view(),
                                 states.view_mut(),
                                 observations.view_mut()) {
      Err(Error::DimensionMismatch { left_dim: 2, right_dim: 3, .. }) => {},
      other => panic!("expected DimensionMismatch, got {:?}", other),
    }
    assert!(states.iter().all(|&v| v == 7.0));
    assert!(observations.iter().all(|&v| v == 7.0));
  }

  #[test]
  fn rejects_time_axis_disagreement_without_writing() {
    let model = constant_accel();
    let x0 = arr1(&[0.0, 0.0, 1.0]);
    let mut states = Array::from_elem((3, 4), 7.0);
    let mut observations = Array::from_elem((1, 5), 7.0);

    match sample_trajectory_into(&model, &mut rng(), x0.view(),
                                 states.view_mut(),
                                 observations.view_mut()) {
      Err(Error::DimensionMismatch { left_dim: 4, right_dim: 5, .. }) => {},
      other => panic!("expected DimensionMismatch, got {:?}", other),
    }
    assert!(states.iter().all(|&v| v == 7.0));
    assert!(observations.iter().all(|&v| v == 7.0));
  }

  #[test]
  fn rejects_batch_size_disagreement() {
    let model = constant_accel();
    let x0s = Array::zeros((3, 3));
    let mut states = Array::from_elem((3, 2, 4), 7.0);
    let mut observations = Array::from_elem((1, 2, 4), 7.0);

    match sample_batch_trajectory_into(&model, &mut rng(), x0s.view(),
                                       states.view_mut(),
                                       observations.view_mut()) {
      Err(Error::DimensionMismatch { left_dim: 3, right_dim: 2, .. }) => {},
      other => panic!("expected DimensionMismatch, got {:?}", other),
    }
    assert!(states.iter().all(|&v| v == 7.0));
  }

  #[test]
  fn rejects_empty_time_axis() {
    let model = constant_accel();
    let x0 = arr1(&[0.0, 0.0, 1.0]);
    let mut states = Array::<f64, _>::zeros((3, 0));
    let mut observations = Array::<f64, _>::zeros((1, 0));

    match sample_trajectory_into(&model, &mut rng(), x0.view(),
                                 states.view_mut(),
                                 observations.view_mut()) {
      Err(Error::ZeroDimension { .. }) => {},
      other => panic!("expected ZeroDimension, got {:?}", other),
    }
  }

  #[test]
  fn time_index_counts_columns() {
    let t: Array<f64, ::nd::Ix1> = time_index(4);
    assert_eq!(t, arr1(&[0.0, 1.0, 2.0, 3.0]));
  }
}
