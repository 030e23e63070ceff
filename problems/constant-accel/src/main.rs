
extern crate ndarray as nd;
extern crate rand;
extern crate ssm_core;
extern crate ssm_sampling;

use nd::{arr1, arr2, Array, Ix1, Ix2};
use rand::SeedableRng;

use ssm_core::LinearGaussianModel;
use ssm_sampling::{sample_trajectory, sample_batch_trajectory, time_index};

const STEPS: usize = 20;
const RNG_SEED: [u64; 1] = [42];
const DT: f64 = 1.0;

fn main() {
  let mut rand = rand::Isaac64Rng::from_seed(&RNG_SEED[..]);

  // Constant-acceleration kinematics; only position is observed.
  let f = arr2(&[
    [1.0, DT, 0.5 * DT * DT],
    [0.0, 1.0, DT],
    [0.0, 0.0, 1.0],
  ]);
  let q = Array::<f64, Ix2>::eye(3) * 0.01;
  let h = arr2(&[[1.0, 0.0, 0.0]]);
  let r = arr2(&[[0.25]]);

  let model = LinearGaussianModel::new(f, q, h, r)
    .expect("model construction failed");

  let x0 = arr1(&[0.0, 0.0, 1.0]);
  let run = sample_trajectory(&model, &mut rand, x0.view(), STEPS)
    .expect("sampling failed");
  let times: Array<f64, Ix1> = time_index(STEPS + 1);

  println!("single run: position / velocity / acceleration, observed position");
  for t in 0..STEPS + 1 {
    let x = run.states.column(t);
    println!("t = {:4.1}: x = [{:9.4}, {:8.4}, {:8.4}]   y = {:9.4}",
             times[[t]], x[[0]], x[[1]], x[[2]],
             run.observations[[0, t]]);
  }

  let x0s = arr2(&[
    [0.0, 0.0, 10.0],
    [0.0, 1.0, -1.0],
    [1.0, 1.0, 0.0],
  ]);
  let batch = sample_batch_trajectory(&model, &mut rand, x0s.view(), STEPS)
    .expect("batch sampling failed");

  println!("");
  println!("batch of {} runs, final observed positions:",
           batch.states.dim().1);
  for i in 0..batch.states.dim().1 {
    println!("member {}: y_T = {:9.4}", i,
             batch.observations[[0, i, STEPS]]);
  }
}
