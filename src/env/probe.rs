use crate::common::{
    errors::Result,
    spaces::{Discrete, Space},
};

use super::{
    base::{Env, EnvObservation, RewardRange},
    render::RenderMode,
};

const N_ACTIONS: usize = 5;
const TARGET: usize = 10;

// Deterministic counter: each action adds its index to the state, the reward is
// the new state, and the episode ends once the state reaches 10. With no
// randomness at all it isolates wrapper and runner plumbing from physics.
#[derive(Debug, Clone)]
pub struct DummyEnv {
    state: usize,
    action_space: Space,
    observation_space: Space,
}

impl DummyEnv {
    pub fn new() -> Result<Self> {
        Ok(Self {
            state: 0,
            action_space: Discrete::new(N_ACTIONS)?.into(),
            // largest reachable state before the episode ends is 9 + 4
            observation_space: Discrete::new(TARGET + N_ACTIONS - 1)?.into(),
        })
    }

    pub fn state(&self) -> usize {
        self.state
    }
}

impl Env<usize, usize> for DummyEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<usize> {
        self.state += action;

        EnvObservation {
            obs: self.state,
            reward: self.state as f64,
            done: self.state >= TARGET,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> usize {
        self.state = 0;
        self.state
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            println!("State: {}", self.state);
        }
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reward_range(&self) -> RewardRange {
        RewardRange {
            low: 0.0,
            high: (TARGET + N_ACTIONS - 1) as f64,
        }
    }

    fn unwrapped(&self) -> &dyn Env<usize, usize> {
        self
    }
}
