use burn::config::Config;
use log::warn;
use rand::rngs::StdRng;

use crate::{
    common::{
        errors::Result,
        spaces::{BoxSpace, Space},
        utils::seeded_rng,
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::RenderMode,
    },
};

use super::mountain_car::{
    render_valley, valley_reset, valley_step, MAX_POSITION, MAX_SPEED, MIN_POSITION,
};

#[derive(Config)]
pub struct MountainCarContinuousConfig {
    #[config(default = 999)]
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl MountainCarContinuousConfig {
    pub fn init(&self) -> Result<MountainCarContinuousEnv> {
        let mut env = MountainCarContinuousEnv {
            goal_position: 0.45,
            power: 0.0015,
            state: vec![0.0, 0.0],
            steps_beyond_done: None,
            curr_steps: 0,
            max_steps: self.max_steps,
            rng: seeded_rng(self.seed),
            action_space: BoxSpace::new(vec![-1.0], vec![1.0])?.into(),
            observation_space: BoxSpace::new(
                vec![MIN_POSITION, -MAX_SPEED],
                vec![MAX_POSITION, MAX_SPEED],
            )?
            .into(),
        };
        env.reset();

        Ok(env)
    }
}

/// Mountain car with a continuous engine. Every step pays for the velocity it
/// carries and reaching the flag pays out 100.
#[derive(Debug, Clone)]
pub struct MountainCarContinuousEnv {
    goal_position: f32,
    power: f32,
    state: Vec<f32>,
    steps_beyond_done: Option<usize>,
    curr_steps: usize,
    max_steps: usize,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

impl Env<Vec<f32>, Vec<f32>> for MountainCarContinuousEnv {
    fn step(&mut self, action: &Vec<f32>) -> EnvObservation<Vec<f32>> {
        let force = action.first().copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        let (p, v) = valley_step(self.state[0], self.state[1], force * self.power);
        self.state = vec![p, v];
        self.curr_steps += 1;

        let reached_goal = p >= self.goal_position;
        let done = reached_goal || self.curr_steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!(
                        "calling step() on a finished MountainCarContinuous episode; \
                         call reset() first"
                    );
                    self.steps_beyond_done = Some(1);
                }
                Some(s) => self.steps_beyond_done = Some(s + 1),
            }
        }

        let mut reward = v as f64 * 0.1;
        if reached_goal {
            reward += 100.0;
        }

        EnvObservation {
            obs: self.state.clone(),
            reward,
            done,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.state = valley_reset(&mut self.rng);
        self.steps_beyond_done = None;
        self.curr_steps = 0;

        self.state.clone()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_valley("MountainCarContinuous", &self.state);
        }
    }

    fn seed(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
        if let Some(seed) = seed {
            self.action_space.seed(seed);
            self.observation_space.seed(seed);
        }
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reward_range(&self) -> RewardRange {
        let per_step = (MAX_SPEED * 0.1) as f64;
        RewardRange {
            low: -per_step,
            high: 100.0 + per_step,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(
            EnvSpec::new("MountainCarContinuous-v0")
                .with_max_episode_steps(self.max_steps)
                .with_reward_threshold(90.0),
        )
    }

    fn unwrapped(&self) -> &dyn Env<Vec<f32>, Vec<f32>> {
        self
    }
}

#[cfg(test)]
mod test {
    use crate::{common::convert::ToSpaceValue, env::base::Env};

    use super::MountainCarContinuousConfig;

    #[test]
    fn test_random_episode_stays_in_space() {
        let mut env = MountainCarContinuousConfig::new()
            .with_seed(Some(0))
            .init()
            .unwrap();
        let mut action_space = env.action_space().clone();
        let mut done = false;
        let mut steps = 0;
        env.reset();

        while !done {
            let a = action_space.sample().try_into().unwrap();
            let res = env.step(&a);
            assert!(env.observation_space().contains(&res.obs.to_space_value()));
            done = res.done;
            steps += 1;
        }

        assert!(steps <= 999);
    }

    #[test]
    fn test_oversized_action_is_clamped() {
        let mut a = MountainCarContinuousConfig::new()
            .with_seed(Some(2))
            .init()
            .unwrap();
        let mut b = a.clone();

        let res_a = a.step(&vec![50.0]);
        let res_b = b.step(&vec![1.0]);
        assert_eq!(res_a.obs, res_b.obs);
        assert_eq!(res_a.reward, res_b.reward);
    }

    #[test]
    fn test_goal_pays_out() {
        let mut env = MountainCarContinuousConfig::new()
            .with_seed(Some(0))
            .init()
            .unwrap();
        let mut obs = env.reset();
        let mut last = None;

        for _ in 0..999 {
            let push = if obs[1] < 0.0 { -1.0 } else { 1.0 };
            let res = env.step(&vec![push]);
            obs = res.obs.clone();
            if res.done {
                last = Some(res);
                break;
            }
        }

        let last = last.unwrap();
        assert!(last.obs[0] >= 0.45);
        assert!(last.reward > 100.0);
    }
}
