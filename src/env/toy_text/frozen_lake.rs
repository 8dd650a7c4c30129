use burn::config::Config;
use log::warn;
use ndarray::Array2;

use crate::{
    common::{
        errors::{GymError, Result},
        spaces::{Discrete, Space},
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::{render_header, RenderMode},
    },
};

use super::{grid_lines, grid_move, parse_grid};

pub const DEFAULT_MAP: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

#[derive(Config)]
pub struct FrozenLakeConfig {
    /// Rows of `S` start, `F` frozen, `H` hole, `G` goal. Defaults to the 4x4
    /// lake.
    pub map: Option<Vec<String>>,
    #[config(default = 100)]
    pub max_steps: usize,
}

impl FrozenLakeConfig {
    pub fn init(&self) -> Result<FrozenLakeEnv> {
        let rows = match &self.map {
            Some(rows) => rows.clone(),
            None => DEFAULT_MAP.iter().map(|r| r.to_string()).collect(),
        };
        let map = parse_grid(&rows)?;

        if let Some(cell) = map.iter().find(|c| !b"SFHG".contains(c)) {
            return Err(GymError::InvalidConfig(format!(
                "unknown lake cell '{}'",
                *cell as char
            )));
        }
        let start = map
            .iter()
            .position(|c| *c == b'S')
            .ok_or_else(|| GymError::InvalidConfig("lake has no start cell".into()))?;

        let n_states = map.len();
        let mut env = FrozenLakeEnv {
            map,
            start,
            state: start,
            steps_beyond_done: None,
            curr_steps: 0,
            max_steps: self.max_steps,
            action_space: Discrete::new(4)?.into(),
            observation_space: Discrete::new(n_states)?.into(),
        };
        env.reset();

        Ok(env)
    }
}

/// Walk across a frozen lake from the start to the goal without falling into a
/// hole. Moves are deterministic; only reaching the goal is rewarded.
#[derive(Debug, Clone)]
pub struct FrozenLakeEnv {
    map: Array2<u8>,
    start: usize,
    state: usize,
    steps_beyond_done: Option<usize>,
    curr_steps: usize,
    max_steps: usize,
    action_space: Space,
    observation_space: Space,
}

impl FrozenLakeEnv {
    fn cell(&self, state: usize) -> u8 {
        let ncol = self.map.ncols();
        self.map[(state / ncol, state % ncol)]
    }
}

impl Env<usize, usize> for FrozenLakeEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<usize> {
        let (nrow, ncol) = self.map.dim();
        self.state = grid_move(self.state, *action, nrow, ncol);
        self.curr_steps += 1;

        let cell = self.cell(self.state);
        let done = cell == b'G' || cell == b'H' || self.curr_steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("calling step() on a finished FrozenLake episode; call reset() first");
                    self.steps_beyond_done = Some(1);
                }
                Some(s) => self.steps_beyond_done = Some(s + 1),
            }
        }

        EnvObservation {
            obs: self.state,
            reward: if cell == b'G' { 1.0 } else { 0.0 },
            done,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> usize {
        self.state = self.start;
        self.steps_beyond_done = None;
        self.curr_steps = 0;

        self.state
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("FrozenLake");
            let cells = self.map.iter().map(|c| *c as char);
            for line in grid_lines(self.state, self.map.ncols(), cells) {
                println!("{line}");
            }
        }
    }

    // moves are deterministic, only the spaces carry randomness
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
            low: 0.0,
            high: 1.0,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(
            EnvSpec::new("FrozenLake-v1")
                .with_max_episode_steps(self.max_steps)
                .with_reward_threshold(0.7),
        )
    }

    fn unwrapped(&self) -> &dyn Env<usize, usize> {
        self
    }
}

#[cfg(test)]
mod test {
    use crate::{
        common::errors::GymError,
        env::{
            base::Env,
            toy_text::{DOWN, LEFT, RIGHT},
        },
    };

    use super::FrozenLakeConfig;

    #[test]
    fn test_shortest_path_reaches_goal() {
        let mut env = FrozenLakeConfig::new().init().unwrap();
        assert_eq!(env.reset(), 0);

        let path = [DOWN, DOWN, RIGHT, RIGHT, DOWN, RIGHT];
        let mut rewards = vec![];
        let mut res = None;
        for a in path {
            let r = env.step(&a);
            rewards.push(r.reward);
            res = Some(r);
        }

        let last = res.unwrap();
        assert_eq!(last.obs, 15);
        assert!(last.done);
        assert_eq!(rewards, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_hole_ends_episode_without_reward() {
        let mut env = FrozenLakeConfig::new().init().unwrap();
        env.reset();

        env.step(&DOWN);
        let res = env.step(&RIGHT);
        assert_eq!(res.obs, 5);
        assert!(res.done);
        assert_eq!(res.reward, 0.0);
    }

    #[test]
    fn test_step_cap() {
        let mut env = FrozenLakeConfig::new().init().unwrap();
        env.reset();

        // pressing into the corner never ends the episode on its own
        for _ in 0..99 {
            assert!(!env.step(&LEFT).done);
        }
        assert!(env.step(&LEFT).done);
    }

    #[test]
    fn test_custom_map() {
        let mut env = FrozenLakeConfig::new()
            .with_map(Some(vec!["FSG".to_string()]))
            .init()
            .unwrap();
        assert_eq!(env.reset(), 1);
        assert_eq!(env.observation_space().shape(), vec![3]);

        let res = env.step(&RIGHT);
        assert_eq!(res.reward, 1.0);
        assert!(res.done);
    }

    #[test]
    fn test_bad_maps_are_rejected() {
        let ragged = FrozenLakeConfig::new().with_map(Some(vec!["SF".into(), "G".into()]));
        assert!(matches!(ragged.init(), Err(GymError::InvalidConfig(_))));

        let no_start = FrozenLakeConfig::new().with_map(Some(vec!["FFG".into()]));
        assert!(matches!(no_start.init(), Err(GymError::InvalidConfig(_))));

        let unknown = FrozenLakeConfig::new().with_map(Some(vec!["SXG".into()]));
        assert!(matches!(unknown.init(), Err(GymError::InvalidConfig(_))));
    }
}
