use burn::config::Config;
use log::warn;

use crate::{
    common::{
        errors::Result,
        spaces::{Discrete, Space},
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::{render_header, RenderMode},
    },
};

use super::{grid_lines, grid_move};

const NROW: usize = 4;
const NCOL: usize = 12;
pub const START: usize = 36;
pub const GOAL: usize = 47;

pub fn is_cliff(state: usize) -> bool {
    (START + 1..GOAL).contains(&state)
}

#[derive(Config)]
pub struct CliffWalkingConfig {
    #[config(default = 100)]
    pub max_steps: usize,
}

impl CliffWalkingConfig {
    pub fn init(&self) -> Result<CliffWalkingEnv> {
        let mut env = CliffWalkingEnv {
            state: START,
            steps_beyond_done: None,
            curr_steps: 0,
            max_steps: self.max_steps,
            action_space: Discrete::new(4)?.into(),
            observation_space: Discrete::new(NROW * NCOL)?.into(),
        };
        env.reset();

        Ok(env)
    }
}

/// A 4x12 grid with a cliff along the bottom edge between the start (bottom
/// left) and the goal (bottom right). Every step costs 1; stepping off the
/// cliff costs 100 and ends the episode.
#[derive(Debug, Clone)]
pub struct CliffWalkingEnv {
    state: usize,
    steps_beyond_done: Option<usize>,
    curr_steps: usize,
    max_steps: usize,
    action_space: Space,
    observation_space: Space,
}

impl Env<usize, usize> for CliffWalkingEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<usize> {
        self.state = grid_move(self.state, *action, NROW, NCOL);
        self.curr_steps += 1;

        let fell = is_cliff(self.state);
        let done = fell || self.state == GOAL || self.curr_steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("calling step() on a finished CliffWalking episode; call reset() first");
                    self.steps_beyond_done = Some(1);
                }
                Some(s) => self.steps_beyond_done = Some(s + 1),
            }
        }

        let reward = if self.state == GOAL {
            0.0
        } else if fell {
            -100.0
        } else {
            -1.0
        };

        EnvObservation {
            obs: self.state,
            reward,
            done,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> usize {
        self.state = START;
        self.steps_beyond_done = None;
        self.curr_steps = 0;

        self.state
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("CliffWalking");
            let cells = (0..NROW * NCOL).map(|i| match i {
                GOAL => 'G',
                i if is_cliff(i) => 'C',
                _ => '.',
            });
            for line in grid_lines(self.state, NCOL, cells) {
                println!("{line}");
            }
        }
    }

    fn seed(&mut self, seed: Option<u64>) {
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
        RewardRange {
            low: -100.0,
            high: 0.0,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(EnvSpec::new("CliffWalking-v0").with_max_episode_steps(self.max_steps))
    }

    fn unwrapped(&self) -> &dyn Env<usize, usize> {
        self
    }
}
