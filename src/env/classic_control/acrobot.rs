use std::f32::consts::PI;

use burn::config::Config;
use log::warn;
use rand::rngs::StdRng;

use crate::{
    common::{
        errors::Result,
        spaces::{BoxSpace, Discrete, Space},
        utils::{angle_normalise, generate_random_vector, seeded_rng},
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::{render_header, RenderMode},
    },
};

const LINK_LENGTH_1: f32 = 1.0;
const LINK_MASS_1: f32 = 1.0;
const LINK_MASS_2: f32 = 1.0;
const LINK_COM_POS_1: f32 = 0.5;
const LINK_COM_POS_2: f32 = 0.5;
const LINK_MOI: f32 = 1.0;
const MAX_VEL_1: f32 = 4.0 * PI;
const MAX_VEL_2: f32 = 9.0 * PI;
const AVAIL_TORQUE: [f32; 3] = [-1.0, 0.0, 1.0];

#[derive(Config)]
pub struct AcrobotConfig {
    #[config(default = 500)]
    pub max_steps: usize,
    #[config(default = 0.2)]
    pub dt: f32,
    pub seed: Option<u64>,
}

impl AcrobotConfig {
    pub fn init(&self) -> Result<AcrobotEnv> {
        let high = vec![1.0, 1.0, 1.0, 1.0, MAX_VEL_1, MAX_VEL_2];
        let low = high.iter().map(|h| -h).collect();

        let mut env = AcrobotEnv {
            dt: self.dt,
            g: 9.8,
            state: vec![0.0; 4],
            steps_beyond_done: None,
            max_steps: self.max_steps,
            curr_steps: 0,
            rng: seeded_rng(self.seed),
            action_space: Discrete::new(AVAIL_TORQUE.len())?.into(),
            observation_space: BoxSpace::new(low, high)?.into(),
        };
        env.reset();

        Ok(env)
    }
}

/// Two link pendulum actuated at the joint between the links. The goal is to
/// swing the tip above the bar at height one link length.
///
/// Actions outside the three torques apply no torque.
#[derive(Debug, Clone)]
pub struct AcrobotEnv {
    dt: f32,
    g: f32,
    // theta1, theta2, dtheta1, dtheta2
    state: Vec<f32>,
    steps_beyond_done: Option<usize>,
    max_steps: usize,
    curr_steps: usize,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

impl AcrobotEnv {
    fn get_obs(&self) -> Vec<f32> {
        let (t1, t2) = (self.state[0], self.state[1]);
        vec![
            t1.cos(),
            t1.sin(),
            t2.cos(),
            t2.sin(),
            self.state[2],
            self.state[3],
        ]
    }

    /// Height of the free end relative to the pivot, in link lengths.
    pub fn tip_height(&self) -> f32 {
        let (t1, t2) = (self.state[0], self.state[1]);
        -t1.cos() - (t1 + t2).cos()
    }

    // angular accelerations for the current state under torque `u`
    fn dynamics(&self, u: f32) -> (f32, f32) {
        let (theta1, theta2, dtheta1, dtheta2) =
            (self.state[0], self.state[1], self.state[2], self.state[3]);
        let (m1, m2, l1, lc1, lc2) = (
            LINK_MASS_1,
            LINK_MASS_2,
            LINK_LENGTH_1,
            LINK_COM_POS_1,
            LINK_COM_POS_2,
        );
        let g = self.g;

        let d1 = m1 * lc1.powi(2)
            + m2 * (l1.powi(2) + lc2.powi(2) + 2.0 * l1 * lc2 * theta2.cos())
            + 2.0 * LINK_MOI;
        let d2 = m2 * (lc2.powi(2) + l1 * lc2 * theta2.cos()) + LINK_MOI;
        let phi2 = m2 * lc2 * g * (theta1 + theta2 - PI / 2.0).cos();
        let phi1 = -m2 * l1 * lc2 * dtheta2.powi(2) * theta2.sin()
            - 2.0 * m2 * l1 * lc2 * dtheta2 * dtheta1 * theta2.sin()
            + (m1 * lc1 + m2 * l1) * g * (theta1 - PI / 2.0).cos()
            + phi2;

        let ddtheta2 = (u + d2 / d1 * phi1 - m2 * l1 * lc2 * dtheta1.powi(2) * theta2.sin() - phi2)
            / (m2 * lc2.powi(2) + LINK_MOI - d2.powi(2) / d1);
        let ddtheta1 = -(d2 * ddtheta2 + phi1) / d1;

        (ddtheta1, ddtheta2)
    }
}

impl Env<Vec<f32>, usize> for AcrobotEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<Vec<f32>> {
        let u = AVAIL_TORQUE.get(*action).copied().unwrap_or(0.0);
        let (ddtheta1, ddtheta2) = self.dynamics(u);

        let dtheta1 = (self.state[2] + self.dt * ddtheta1).clamp(-MAX_VEL_1, MAX_VEL_1);
        let dtheta2 = (self.state[3] + self.dt * ddtheta2).clamp(-MAX_VEL_2, MAX_VEL_2);
        let theta1 = angle_normalise(self.state[0] + self.dt * dtheta1);
        let theta2 = angle_normalise(self.state[1] + self.dt * dtheta2);

        self.state = vec![theta1, theta2, dtheta1, dtheta2];
        self.curr_steps += 1;

        let done = self.tip_height() > 1.0 || self.curr_steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("calling step() on a finished Acrobot episode; call reset() first");
                    self.steps_beyond_done = Some(1);
                }
                Some(s) => self.steps_beyond_done = Some(s + 1),
            }
        }

        EnvObservation {
            obs: self.get_obs(),
            reward: if done { 0.0 } else { -1.0 },
            done,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.state = generate_random_vector(&mut self.rng, &[-0.05; 4], &[0.05; 4]);
        self.steps_beyond_done = None;
        self.curr_steps = 0;

        self.get_obs()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("Acrobot");
            println!("State: {:?}", self.get_obs());
            println!("Tip height: {:.3}", self.tip_height());
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
        RewardRange {
            low: -1.0,
            high: 0.0,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(
            EnvSpec::new("Acrobot-v1")
                .with_max_episode_steps(self.max_steps)
                .with_reward_threshold(-100.0),
        )
    }

    fn unwrapped(&self) -> &dyn Env<Vec<f32>, usize> {
        self
    }
}
