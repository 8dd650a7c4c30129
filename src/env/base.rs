use std::collections::HashMap;

use dyn_clone::DynClone;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::common::{
    convert::ToSpaceValue,
    errors::{GymError, Result},
    spaces::Space,
};

use super::render::RenderMode;

/// A single entry of the step side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InfoData {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for InfoData {
    fn from(value: bool) -> Self {
        InfoData::Bool(value)
    }
}

impl From<i64> for InfoData {
    fn from(value: i64) -> Self {
        InfoData::Int(value)
    }
}

impl From<usize> for InfoData {
    fn from(value: usize) -> Self {
        InfoData::Int(value as i64)
    }
}

impl From<f64> for InfoData {
    fn from(value: f64) -> Self {
        InfoData::Float(value)
    }
}

impl From<&str> for InfoData {
    fn from(value: &str) -> Self {
        InfoData::String(value.to_string())
    }
}

/// String keyed side channel returned by every step. Keys are environment
/// specific and not part of the stability contract.
pub type Info = HashMap<String, InfoData>;

#[derive(Clone, Debug)]
pub struct EnvObservation<O> {
    pub obs: O,
    pub reward: f64,
    pub done: bool,
    pub info: Info,
}

#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardRange {
    pub low: f64,
    pub high: f64,
}

impl Default for RewardRange {
    fn default() -> Self {
        Self {
            low: f64::NEG_INFINITY,
            high: f64::INFINITY,
        }
    }
}

/// Registration record of an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvSpec {
    /// Identifier following the `Name-vN` convention, e.g. `CartPole-v1`.
    pub id: String,
    pub max_episode_steps: Option<usize>,
    /// Average return at which the task counts as solved.
    pub reward_threshold: Option<f64>,
    /// Whether outcomes depend on randomness the env seed does not control.
    pub nondeterministic: bool,
}

impl EnvSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_episode_steps: None,
            reward_threshold: None,
            nondeterministic: false,
        }
    }

    pub fn with_max_episode_steps(mut self, steps: usize) -> Self {
        self.max_episode_steps = Some(steps);
        self
    }

    pub fn with_reward_threshold(mut self, threshold: f64) -> Self {
        self.reward_threshold = Some(threshold);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub render_modes: Vec<RenderMode>,
    pub render_fps: Option<u32>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            render_modes: vec![RenderMode::Human],
            render_fps: None,
        }
    }
}

/// The contract every simulation implements.
///
/// `step` assumes the action is a member of `action_space()`; callers that
/// cannot guarantee this go through `try_step`, the single place actions are
/// validated. Stepping a finished episode without `reset` is allowed and
/// continues degenerately; each environment documents what it reports then.
pub trait Env<O, A>: DynClone {
    fn step(&mut self, action: &A) -> EnvObservation<O>;

    /// Fully reinitialises the episode and returns the first observation.
    fn reset(&mut self) -> O;

    fn render(&self, mode: RenderMode);

    /// Releases external resources. Safe to call repeatedly.
    fn close(&mut self) {}

    /// Reseeds the owned generator(s). `None` draws a fresh seed from entropy.
    fn seed(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            warn!("environment has no random state, dropping seed {seed}");
        }
    }

    fn action_space(&self) -> &Space;

    fn observation_space(&self) -> &Space;

    fn reward_range(&self) -> RewardRange {
        RewardRange::default()
    }

    fn spec(&self) -> Option<EnvSpec> {
        None
    }

    fn metadata(&self) -> Metadata {
        Metadata::default()
    }

    /// The innermost environment, with every wrapper peeled off.
    fn unwrapped(&self) -> &dyn Env<O, A>;

    /// Validates `action` against the declared action space, then steps.
    fn try_step(&mut self, action: &A) -> Result<EnvObservation<O>>
    where
        A: ToSpaceValue,
    {
        let value = action.to_space_value();
        if !self.action_space().contains(&value) {
            return Err(GymError::InvalidAction(format!("{value:?}")));
        }

        Ok(self.step(action))
    }
}

dyn_clone::clone_trait_object!(<O, A> Env<O, A>);

#[cfg(test)]
mod test {
    use crate::{
        common::errors::GymError,
        env::{classic_control::cartpole::CartPoleConfig, probe::DummyEnv},
    };

    use super::{Env, InfoData, RewardRange};

    #[test]
    fn test_try_step_rejects_out_of_space_actions() {
        let mut env = CartPoleConfig::new().with_seed(Some(0)).init().unwrap();
        env.reset();

        assert!(env.try_step(&1).is_ok());
        assert!(matches!(env.try_step(&2), Err(GymError::InvalidAction(_))));
    }

    #[test]
    fn test_invalid_action_leaves_state_untouched() {
        let mut env = DummyEnv::new().unwrap();
        env.reset();
        env.step(&2);

        assert!(env.try_step(&100).is_err());
        let res = env.step(&1);
        assert_eq!(res.obs, 3);
    }

    #[test]
    fn test_boxed_envs_clone() {
        let mut env: Box<dyn Env<usize, usize>> = Box::new(DummyEnv::new().unwrap());
        env.reset();
        env.step(&3);

        let mut copy = env.clone();
        assert_eq!(copy.step(&1).obs, 4);
        assert_eq!(env.step(&2).obs, 5);
    }

    #[test]
    fn test_defaults() {
        let range = RewardRange::default();
        assert!(range.low.is_infinite() && range.high.is_infinite());
        assert_eq!(InfoData::from(3usize), InfoData::Int(3));
    }
}
