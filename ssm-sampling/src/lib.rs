//! Trajectory sampling for discrete time state space models.
//!
//! Forward-simulates any `ssm_core::Model`: single steps or whole
//! trajectories, one run or a batch of independent runs in lockstep,
//! into caller buffers or freshly allocated ones.

extern crate ndarray as nd;
extern crate num_traits;
extern crate rand;
extern crate ssm_core;

pub use step::{advance_state_into, observe_into, step_into,
               advance_state_batch_into, observe_batch_into,
               step_batch_into};
pub use trajectory::{Trajectory, BatchTrajectory, time_index,
                     sample_trajectory_with_noise,
                     sample_observations_with_noise,
                     sample_batch_trajectory_with_noise,
                     sample_batch_observations_with_noise,
                     sample_trajectory_into, sample_observations_into,
                     sample_batch_trajectory_into,
                     sample_batch_observations_into,
                     sample_trajectory, sample_observations,
                     sample_batch_trajectory, sample_batch_observations};

pub mod step;
pub mod trajectory;
