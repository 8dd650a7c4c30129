use std::f32::consts::PI;

use burn::config::Config;
use log::warn;
use rand::rngs::StdRng;

use crate::{
    common::{
        errors::Result,
        spaces::{BoxSpace, Discrete, Space},
        utils::{generate_random_vector, seeded_rng},
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::{render_header, track_line, RenderMode},
    },
};

#[derive(Config)]
pub struct CartPoleConfig {
    #[config(default = 500)]
    pub max_steps: usize,
    /// Reward 0 while balancing and -1 once the pole falls.
    #[config(default = false)]
    pub sutton_barto_reward: bool,
    /// Explicit Euler when true, semi-implicit Euler otherwise.
    #[config(default = true)]
    pub euler_integration: bool,
    pub seed: Option<u64>,
}

impl CartPoleConfig {
    pub fn init(&self) -> Result<CartPoleEnv> {
        let theta_threshold_radians = 12.0 * PI / 180.0;
        let mut env = CartPoleEnv {
            sutton_barto_reward: self.sutton_barto_reward,
            euler_integration: self.euler_integration,
            gravity: 9.8,
            masspole: 0.1,
            total_mass: 1.1,
            length: 0.5,
            polemass_length: 0.05,
            force_mag: 10.0,
            tau: 0.02,
            theta_threshold_radians,
            x_threshold: 2.4,
            state: vec![0.0; 4],
            steps_beyond_terminated: None,
            max_steps: self.max_steps,
            curr_steps: 0,
            rng: seeded_rng(self.seed),
            action_space: Discrete::new(2)?.into(),
            observation_space: BoxSpace::new(
                vec![-2.4, -3.0, -0.2095, -3.0],
                vec![2.4, 3.0, 0.2095, 3.0],
            )?
            .into(),
        };
        env.reset();

        Ok(env)
    }
}

/// A pole hinged on a cart moving along a frictionless track. Action 1 pushes
/// the cart right, anything else pushes it left.
#[derive(Debug, Clone)]
pub struct CartPoleEnv {
    sutton_barto_reward: bool,
    euler_integration: bool,
    gravity: f32,
    masspole: f32,
    total_mass: f32,
    // half the pole's length
    length: f32,
    polemass_length: f32,
    force_mag: f32,
    tau: f32,
    theta_threshold_radians: f32,
    x_threshold: f32,
    state: Vec<f32>,
    steps_beyond_terminated: Option<usize>,
    max_steps: usize,
    curr_steps: usize,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

impl CartPoleEnv {
    pub fn state(&self) -> &[f32] {
        &self.state
    }
}

impl Env<Vec<f32>, usize> for CartPoleEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<Vec<f32>> {
        let mut x = self.state[0];
        let mut x_dot = self.state[1];
        let mut theta = self.state[2];
        let mut theta_dot = self.state[3];

        let force = if *action == 1 {
            self.force_mag
        } else {
            -self.force_mag
        };

        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        let temp = (force + self.polemass_length * theta_dot.powi(2) * sin_theta) / self.total_mass;
        let theta_acc = (self.gravity * sin_theta - cos_theta * temp)
            / (self.length * (4.0 / 3.0 - self.masspole * cos_theta.powi(2) / self.total_mass));
        let x_acc = temp - self.polemass_length * theta_acc * cos_theta / self.total_mass;

        if self.euler_integration {
            x += self.tau * x_dot;
            x_dot += self.tau * x_acc;
            theta += self.tau * theta_dot;
            theta_dot += self.tau * theta_acc;
        } else {
            x_dot += self.tau * x_acc;
            x += self.tau * x_dot;
            theta_dot += self.tau * theta_acc;
            theta += self.tau * theta_dot;
        }

        self.state = vec![x, x_dot, theta, theta_dot];
        self.curr_steps += 1;

        let done = x < -self.x_threshold
            || x > self.x_threshold
            || theta < -self.theta_threshold_radians
            || theta > self.theta_threshold_radians
            || self.curr_steps >= self.max_steps;

        let reward = match (done, self.sutton_barto_reward) {
            (false, false) => 1.0,
            (false, true) => 0.0,
            (true, sutton_barto) => {
                match self.steps_beyond_terminated {
                    None => self.steps_beyond_terminated = Some(0),
                    Some(0) => {
                        warn!(
                            "calling step() on a CartPole episode that has already \
                             terminated; call reset() first"
                        );
                        self.steps_beyond_terminated = Some(1);
                    }
                    Some(s) => self.steps_beyond_terminated = Some(s + 1),
                }

                if sutton_barto {
                    -1.0
                } else {
                    0.0
                }
            }
        };

        EnvObservation {
            obs: self.state.clone(),
            reward,
            done,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.state = generate_random_vector(&mut self.rng, &[-0.05; 4], &[0.05; 4]);
        self.steps_beyond_terminated = None;
        self.curr_steps = 0;

        self.state.clone()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("CartPole");
            println!(
                "x: {:.3}, x_dot: {:.3}, theta: {:.3}, theta_dot: {:.3}",
                self.state[0], self.state[1], self.state[2], self.state[3]
            );
            println!(
                "{}",
                track_line(self.state[0], -self.x_threshold, self.x_threshold, 41)
            );
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
        if self.sutton_barto_reward {
            RewardRange {
                low: -1.0,
                high: 0.0,
            }
        } else {
            RewardRange {
                low: 0.0,
                high: 1.0,
            }
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(
            EnvSpec::new("CartPole-v1")
                .with_max_episode_steps(self.max_steps)
                .with_reward_threshold(475.0),
        )
    }

    fn unwrapped(&self) -> &dyn Env<Vec<f32>, usize> {
        self
    }
}
