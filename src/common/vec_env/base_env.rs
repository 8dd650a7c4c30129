use crate::{
    common::{errors::Result, spaces::Space},
    env::{
        base::{EnvObservation, Info, RewardRange},
        render::RenderMode,
    },
};

/// One step of every env in a batch, column by column. Entry `i` of each
/// vector belongs to env `i`.
#[derive(Clone, Debug)]
pub struct VecEnvObservation<O> {
    pub obs: Vec<O>,
    pub reward: Vec<f64>,
    pub done: Vec<bool>,
    pub info: Vec<Info>,
}

impl<O> VecEnvObservation<O> {
    pub fn new(results: Vec<EnvObservation<O>>) -> Self {
        let mut obs = Vec::with_capacity(results.len());
        let mut reward = Vec::with_capacity(results.len());
        let mut done = Vec::with_capacity(results.len());
        let mut info = Vec::with_capacity(results.len());

        for r in results {
            obs.push(r.obs);
            reward.push(r.reward);
            done.push(r.done);
            info.push(r.info);
        }

        Self {
            obs,
            reward,
            done,
            info,
        }
    }

    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs.is_empty()
    }
}

/// A fixed batch of independent environments driven in lockstep.
///
/// Finished envs are not reset automatically; wrap them in an
/// `AutoResetWrapper` for that.
pub trait VecEnv<O, A> {
    /// Steps env `i` with `actions[i]`.
    fn step(&mut self, actions: Vec<A>) -> Result<VecEnvObservation<O>> {
        self.step_async(actions)?;
        self.step_wait()
    }

    fn step_async(&mut self, actions: Vec<A>) -> Result<()>;

    fn step_wait(&mut self) -> Result<VecEnvObservation<O>>;

    fn reset(&mut self) -> Vec<O>;

    /// Seeds env `i` with `seed + i`, or every env from entropy for `None`.
    fn seed(&mut self, seed: Option<u64>);

    fn num_envs(&self) -> usize;

    fn action_space(&self) -> &Space;

    fn observation_space(&self) -> &Space;

    fn reward_range(&self) -> RewardRange;

    fn render(&self, mode: RenderMode);

    fn close(&mut self);
}
