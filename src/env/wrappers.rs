use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{errors::Result, spaces::Space};

use super::{
    base::{Env, EnvObservation, EnvSpec, Info, InfoData, Metadata, RewardRange},
    render::RenderMode,
};

// Forwards the read-only part of the contract to `self.env`.
macro_rules! forward_env_metadata {
    ($o:ty, $a:ty) => {
        fn render(&self, mode: RenderMode) {
            self.env.render(mode)
        }

        fn close(&mut self) {
            self.env.close()
        }

        fn seed(&mut self, seed: Option<u64>) {
            self.env.seed(seed)
        }

        fn action_space(&self) -> &Space {
            self.env.action_space()
        }

        fn observation_space(&self) -> &Space {
            self.env.observation_space()
        }

        fn reward_range(&self) -> RewardRange {
            self.env.reward_range()
        }

        fn metadata(&self) -> Metadata {
            self.env.metadata()
        }

        fn unwrapped(&self) -> &dyn Env<$o, $a> {
            self.env.unwrapped()
        }
    };
}

/// Forces `done` once an episode reaches `max_steps`, marking the cut in the
/// info map as `TimeLimit.truncated` (false if the env finished on its own on
/// that same step).
#[derive(Clone)]
pub struct TimeLimitWrapper<O, A> {
    env: Box<dyn Env<O, A>>,
    max_steps: usize,
    curr_steps: usize,
}

impl<O, A> TimeLimitWrapper<O, A> {
    pub fn new(env: Box<dyn Env<O, A>>, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            curr_steps: 0,
        }
    }
}

impl<O: Clone, A: Clone> Env<O, A> for TimeLimitWrapper<O, A> {
    fn step(&mut self, action: &A) -> EnvObservation<O> {
        let mut step_result = self.env.step(action);

        self.curr_steps += 1;
        if self.curr_steps >= self.max_steps {
            step_result.info.insert(
                "TimeLimit.truncated".to_string(),
                InfoData::Bool(!step_result.done),
            );
            step_result.done = true;
        }

        step_result
    }

    fn reset(&mut self) -> O {
        self.curr_steps = 0;

        self.env.reset()
    }

    fn spec(&self) -> Option<EnvSpec> {
        self.env
            .spec()
            .map(|spec| spec.with_max_episode_steps(self.max_steps))
    }

    forward_env_metadata!(O, A);
}

/// Resets the inner env as soon as an episode finishes. The step that
/// finishes still reports `done`, but carries the first observation of the
/// next episode; the last observation and info are kept on the wrapper.
#[derive(Clone)]
pub struct AutoResetWrapper<O, A> {
    env: Box<dyn Env<O, A>>,
    final_observation: Option<O>,
    final_info: Option<Info>,
}

impl<O, A> AutoResetWrapper<O, A> {
    pub fn new(env: Box<dyn Env<O, A>>) -> Self {
        Self {
            env,
            final_observation: None,
            final_info: None,
        }
    }

    /// Last observation of the most recently finished episode.
    pub fn final_observation(&self) -> Option<&O> {
        self.final_observation.as_ref()
    }

    pub fn final_info(&self) -> Option<&Info> {
        self.final_info.as_ref()
    }
}

impl<O: Clone, A: Clone> Env<O, A> for AutoResetWrapper<O, A> {
    fn step(&mut self, action: &A) -> EnvObservation<O> {
        let mut step_result = self.env.step(action);

        if step_result.done {
            let final_info = std::mem::take(&mut step_result.info);
            step_result
                .info
                .insert("final_observation".to_string(), InfoData::Bool(true));
            step_result
                .info
                .insert("final_info".to_string(), InfoData::Bool(true));

            let new_obs = self.env.reset();
            self.final_observation = Some(std::mem::replace(&mut step_result.obs, new_obs));
            self.final_info = Some(final_info);
        }

        step_result
    }

    fn reset(&mut self) -> O {
        self.final_observation = None;
        self.final_info = None;

        self.env.reset()
    }

    fn spec(&self) -> Option<EnvSpec> {
        self.env.spec()
    }

    forward_env_metadata!(O, A);
}

/// Return and length of one finished (or abandoned) episode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStatistics {
    #[serde(rename = "return")]
    pub reward: f64,
    pub length: usize,
}

/// Tracks the return and length of every episode that passes through it.
///
/// An episode is recorded when `done` is seen, or on `reset` if it was cut
/// short. Finished episodes also get `episode.r` and `episode.l` in their
/// info map.
#[derive(Clone)]
pub struct RecordEpisodeStatistics<O, A> {
    env: Box<dyn Env<O, A>>,
    episode_reward: f64,
    episode_length: usize,
    history: Vec<EpisodeStatistics>,
}

impl<O, A> RecordEpisodeStatistics<O, A> {
    pub fn new(env: Box<dyn Env<O, A>>) -> Self {
        Self {
            env,
            episode_reward: 0.0,
            episode_length: 0,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[EpisodeStatistics] {
        &self.history
    }

    pub fn episode_rewards(&self) -> Vec<f64> {
        self.history.iter().map(|e| e.reward).collect()
    }

    pub fn episode_lengths(&self) -> Vec<usize> {
        self.history.iter().map(|e| e.length).collect()
    }

    /// Writes the recorded episodes as `return,length` rows.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for episode in &self.history {
            writer.serialize(episode)?;
        }
        writer.flush()?;

        debug!(
            "wrote {} episodes to {}",
            self.history.len(),
            path.as_ref().display()
        );

        Ok(())
    }

    fn finish_episode(&mut self) -> EpisodeStatistics {
        let stats = EpisodeStatistics {
            reward: self.episode_reward,
            length: self.episode_length,
        };
        self.history.push(stats);
        self.episode_reward = 0.0;
        self.episode_length = 0;

        stats
    }
}

impl<O: Clone, A: Clone> Env<O, A> for RecordEpisodeStatistics<O, A> {
    fn step(&mut self, action: &A) -> EnvObservation<O> {
        let mut step_result = self.env.step(action);

        self.episode_reward += step_result.reward;
        self.episode_length += 1;

        if step_result.done {
            let stats = self.finish_episode();
            step_result
                .info
                .insert("episode.r".to_string(), stats.reward.into());
            step_result
                .info
                .insert("episode.l".to_string(), stats.length.into());
        }

        step_result
    }

    fn reset(&mut self) -> O {
        if self.episode_length > 0 {
            self.finish_episode();
        }

        self.env.reset()
    }

    fn spec(&self) -> Option<EnvSpec> {
        self.env.spec()
    }

    forward_env_metadata!(O, A);
}

pub trait ObservationTransform<O>: Clone {
    fn transform_observation(&self, obs: O) -> O {
        obs
    }
}

pub trait ActionTransform<A>: Clone {
    fn transform_action(&self, action: A) -> A {
        action
    }
}

pub trait RewardTransform: Clone {
    fn transform_reward(&self, reward: f64) -> f64 {
        reward
    }
}

/// The transform that changes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<O> ObservationTransform<O> for Identity {}

impl<A> ActionTransform<A> for Identity {}

impl RewardTransform for Identity {}

/// Clips every reward into `[low, high]`.
#[derive(Clone, Copy, Debug)]
pub struct ClipReward {
    pub low: f64,
    pub high: f64,
}

impl RewardTransform for ClipReward {
    fn transform_reward(&self, reward: f64) -> f64 {
        reward.clamp(self.low, self.high)
    }
}

/// Multiplies every component of a vector observation by `scale`.
#[derive(Clone, Copy, Debug)]
pub struct ScaleObservation {
    pub scale: f32,
}

impl ObservationTransform<Vec<f32>> for ScaleObservation {
    fn transform_observation(&self, obs: Vec<f32>) -> Vec<f32> {
        obs.into_iter().map(|o| o * self.scale).collect()
    }
}

/// Applies a transform to every observation, including the one from `reset`.
#[derive(Clone)]
pub struct ObservationWrapper<O, A, T> {
    env: Box<dyn Env<O, A>>,
    transform: T,
}

impl<O, A, T: ObservationTransform<O>> ObservationWrapper<O, A, T> {
    pub fn new(env: Box<dyn Env<O, A>>, transform: T) -> Self {
        Self { env, transform }
    }
}

impl<O: Clone, A: Clone, T: ObservationTransform<O>> Env<O, A> for ObservationWrapper<O, A, T> {
    fn step(&mut self, action: &A) -> EnvObservation<O> {
        let step_result = self.env.step(action);

        EnvObservation {
            obs: self.transform.transform_observation(step_result.obs),
            ..step_result
        }
    }

    fn reset(&mut self) -> O {
        self.transform.transform_observation(self.env.reset())
    }

    fn spec(&self) -> Option<EnvSpec> {
        self.env.spec()
    }

    forward_env_metadata!(O, A);
}

/// Applies a transform to every action before it reaches the inner env.
#[derive(Clone)]
pub struct ActionWrapper<O, A, T> {
    env: Box<dyn Env<O, A>>,
    transform: T,
}

impl<O, A, T: ActionTransform<A>> ActionWrapper<O, A, T> {
    pub fn new(env: Box<dyn Env<O, A>>, transform: T) -> Self {
        Self { env, transform }
    }
}

impl<O: Clone, A: Clone, T: ActionTransform<A>> Env<O, A> for ActionWrapper<O, A, T> {
    fn step(&mut self, action: &A) -> EnvObservation<O> {
        let action = self.transform.transform_action(action.clone());
        self.env.step(&action)
    }

    fn reset(&mut self) -> O {
        self.env.reset()
    }

    fn spec(&self) -> Option<EnvSpec> {
        self.env.spec()
    }

    forward_env_metadata!(O, A);
}

/// Applies a transform to every reward.
#[derive(Clone)]
pub struct RewardWrapper<O, A, T> {
    env: Box<dyn Env<O, A>>,
    transform: T,
}

impl<O, A, T: RewardTransform> RewardWrapper<O, A, T> {
    pub fn new(env: Box<dyn Env<O, A>>, transform: T) -> Self {
        Self { env, transform }
    }
}

impl<O: Clone, A: Clone, T: RewardTransform> Env<O, A> for RewardWrapper<O, A, T> {
    fn step(&mut self, action: &A) -> EnvObservation<O> {
        let step_result = self.env.step(action);

        EnvObservation {
            reward: self.transform.transform_reward(step_result.reward),
            ..step_result
        }
    }

    fn reset(&mut self) -> O {
        self.env.reset()
    }

    fn spec(&self) -> Option<EnvSpec> {
        self.env.spec()
    }

    forward_env_metadata!(O, A);
}

#[cfg(test)]
mod test {
    use std::env::temp_dir;

    use crate::env::{
        base::{Env, InfoData},
        classic_control::cartpole::CartPoleConfig,
        probe::DummyEnv,
    };

    use super::{
        ActionWrapper, AutoResetWrapper, ClipReward, Identity, ObservationWrapper,
        RecordEpisodeStatistics, RewardWrapper, ScaleObservation, TimeLimitWrapper,
    };

    fn boxed<E: Env<Vec<f32>, usize> + 'static>(env: E) -> Box<dyn Env<Vec<f32>, usize>> {
        Box::new(env)
    }

    fn dummy() -> Box<dyn Env<usize, usize>> {
        Box::new(DummyEnv::new().unwrap())
    }

    fn rollout(env: &mut dyn Env<Vec<f32>, usize>, n: usize) -> Vec<(Vec<f32>, f64, bool)> {
        let mut out = vec![(env.reset(), 0.0, false)];
        for i in 0..n {
            let res = env.step(&(i % 2));
            out.push((res.obs, res.reward, res.done));
        }
        out
    }

    #[test]
    fn test_time_limit_wrapper() {
        let truncate_steps = 5;
        let unwrapped_env = CartPoleConfig::new().with_seed(Some(0)).init().unwrap();
        let mut wrapped_env = TimeLimitWrapper::new(boxed(unwrapped_env), truncate_steps);
        let mut action_space = wrapped_env.action_space().clone();

        let mut ep_len = 0;
        let mut done = false;
        let mut last = None;

        wrapped_env.reset();
        while !done {
            let step_result = wrapped_env.step(&action_space.sample().try_into().unwrap());
            done = step_result.done;
            ep_len += 1;
            last = Some(step_result);
        }

        assert_eq!(truncate_steps, ep_len);
        assert_eq!(
            last.unwrap().info.get("TimeLimit.truncated"),
            Some(&InfoData::Bool(true))
        );
        assert_eq!(wrapped_env.spec().unwrap().max_episode_steps, Some(5));
    }

    #[test]
    fn test_time_limit_on_natural_end() {
        // DummyEnv finishes after 3 steps of 4, exactly at the limit
        let mut env = TimeLimitWrapper::new(dummy(), 3);
        env.reset();
        env.step(&4);
        let res = env.step(&4);
        assert!(!res.done);
        assert!(!res.info.contains_key("TimeLimit.truncated"));

        let res = env.step(&4);
        assert!(res.done);
        assert_eq!(
            res.info.get("TimeLimit.truncated"),
            Some(&InfoData::Bool(false))
        );

        // the counter starts over
        env.reset();
        assert!(!env.step(&0).done);
    }

    #[test]
    fn test_identity_wrappers_compose_to_identity() {
        let make = || CartPoleConfig::new().with_seed(Some(11)).init().unwrap();

        let mut bare = make();
        let rewards = RewardWrapper::new(boxed(make()), Identity);
        let actions = ActionWrapper::new(boxed(rewards), Identity);
        let mut wrapped = ObservationWrapper::new(boxed(actions), Identity);

        assert_eq!(rollout(&mut bare, 30), rollout(&mut wrapped, 30));
        assert_eq!(wrapped.spec(), bare.spec());
        assert_eq!(
            wrapped.observation_space().shape(),
            bare.observation_space().shape()
        );
    }

    #[test]
    fn test_transforms_apply() {
        let make = || CartPoleConfig::new().with_seed(Some(3)).init().unwrap();

        let mut scaled = ObservationWrapper::new(boxed(make()), ScaleObservation { scale: 2.0 });
        let mut bare = make();
        let a = bare.reset();
        let b = scaled.reset();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x * 2.0, *y);
        }

        let mut clipped = RewardWrapper::new(
            dummy(),
            ClipReward {
                low: 0.0,
                high: 5.0,
            },
        );
        clipped.reset();
        assert_eq!(clipped.step(&3).reward, 3.0);
        assert_eq!(clipped.step(&3).reward, 5.0);
    }

    #[test]
    fn test_auto_reset() {
        let mut env = AutoResetWrapper::new(dummy());
        env.reset();

        env.step(&4);
        env.step(&4);
        let res = env.step(&4);
        assert!(res.done);
        assert_eq!(res.obs, 0);
        assert_eq!(env.final_observation(), Some(&12));
        assert_eq!(res.info.get("final_observation"), Some(&InfoData::Bool(true)));

        // keeps going without an explicit reset
        assert_eq!(env.step(&1).obs, 1);
    }

    #[test]
    fn test_record_episode_statistics() {
        let mut env = RecordEpisodeStatistics::new(dummy());

        env.reset();
        env.step(&4);
        env.step(&4);
        let res = env.step(&4);
        assert!(res.done);
        assert_eq!(res.info.get("episode.r"), Some(&InfoData::Float(24.0)));
        assert_eq!(res.info.get("episode.l"), Some(&InfoData::Int(3)));

        // abandoned mid-episode
        env.reset();
        env.step(&2);
        env.reset();

        assert_eq!(env.episode_rewards(), vec![24.0, 2.0]);
        assert_eq!(env.episode_lengths(), vec![3, 1]);

        let path = temp_dir().join("gym_burn_episode_stats.csv");
        env.write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "return,length\n24.0,3\n2.0,1\n");
        std::fs::remove_file(path).unwrap();
    }
}
