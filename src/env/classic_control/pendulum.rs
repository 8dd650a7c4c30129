use std::f32::consts::PI;

use burn::config::Config;
use rand::rngs::StdRng;

use crate::{
    common::{
        errors::Result,
        spaces::{BoxSpace, Space},
        utils::{angle_normalise, generate_random_vector, seeded_rng},
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::{render_header, RenderMode},
        wrappers::TimeLimitWrapper,
    },
};

/// Episode length the registered Pendulum is cut at.
pub const DEFAULT_MAX_STEPS: usize = 200;

#[derive(Config)]
pub struct PendulumConfig {
    #[config(default = 10.0)]
    pub g: f32,
    pub seed: Option<u64>,
}

impl PendulumConfig {
    pub fn init(&self) -> Result<PendulumEnv> {
        let mut env = PendulumEnv {
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
            g: self.g,
            m: 1.0,
            l: 1.0,
            state: vec![0.0, 0.0],
            last_u: 0.0,
            rng: seeded_rng(self.seed),
            observation_space: BoxSpace::new(vec![-1.0, -1.0, -8.0], vec![1.0, 1.0, 8.0])?
                .into(),
            action_space: BoxSpace::new(vec![-2.0], vec![2.0])?.into(),
        };
        env.reset();

        Ok(env)
    }
}

/// Inverted pendulum swing-up. The episode never ends on its own; wrap it in a
/// time limit (see [`make_pendulum`]).
#[derive(Debug, Clone)]
pub struct PendulumEnv {
    // constant
    max_speed: f32,
    max_torque: f32,
    dt: f32,
    g: f32,
    m: f32,
    l: f32,

    // stateful
    state: Vec<f32>,
    last_u: f32,
    rng: StdRng,
    observation_space: Space,
    action_space: Space,
}

impl PendulumEnv {
    fn get_obs(&self) -> Vec<f32> {
        let theta = self.state[0];
        let theta_dot = self.state[1];

        vec![theta.cos(), theta.sin(), theta_dot]
    }

    /// Torque applied on the last step, after clamping.
    pub fn last_torque(&self) -> f32 {
        self.last_u
    }
}

impl Env<Vec<f32>, Vec<f32>> for PendulumEnv {
    fn step(&mut self, action: &Vec<f32>) -> EnvObservation<Vec<f32>> {
        let th = self.state[0];
        let th_dot = self.state[1];

        let u = action
            .first()
            .copied()
            .unwrap_or(0.0)
            .clamp(-self.max_torque, self.max_torque);
        self.last_u = u;

        let costs = angle_normalise(th).powi(2) + 0.1 * th_dot.powi(2) + 0.001 * u.powi(2);

        let new_th_dot = th_dot
            + (-3.0 * self.g / (2.0 * self.l) * (th + PI).sin()
                + 3.0 / (self.m * self.l.powi(2)) * u)
                * self.dt;
        let new_th_dot = new_th_dot.clamp(-self.max_speed, self.max_speed);
        let new_th = angle_normalise(th + new_th_dot * self.dt);

        self.state = vec![new_th, new_th_dot];

        EnvObservation {
            obs: self.get_obs(),
            reward: -costs as f64,
            done: false,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.last_u = 0.0;
        self.state = generate_random_vector(&mut self.rng, &[-PI, -0.5], &[PI, 0.5]);

        self.get_obs()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("Pendulum");
            println!(
                "theta: {:.3}, theta_dot: {:.3}, torque: {:.3}",
                self.state[0], self.state[1], self.last_u
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
        let worst = PI.powi(2) + 0.1 * self.max_speed.powi(2) + 0.001 * self.max_torque.powi(2);
        RewardRange {
            low: -worst as f64,
            high: 0.0,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(EnvSpec::new("Pendulum-v1").with_max_episode_steps(DEFAULT_MAX_STEPS))
    }

    fn unwrapped(&self) -> &dyn Env<Vec<f32>, Vec<f32>> {
        self
    }
}

/// Builds a Pendulum cut off after `max_steps` (200 when `None`).
pub fn make_pendulum(
    max_steps: Option<usize>,
    seed: Option<u64>,
) -> Result<Box<dyn Env<Vec<f32>, Vec<f32>>>> {
    let max_steps = max_steps.unwrap_or(DEFAULT_MAX_STEPS);

    let env: Box<dyn Env<Vec<f32>, Vec<f32>>> =
        Box::new(PendulumConfig::new().with_seed(seed).init()?);
    let env = TimeLimitWrapper::new(env, max_steps);

    Ok(Box::new(env))
}

#[cfg(test)]
mod test {
    use std::f32::consts::PI;

    use assert_approx_eq::assert_approx_eq;

    use crate::env::base::Env;

    use super::{make_pendulum, PendulumConfig};

    #[test]
    fn test_make_env() {
        let mut env = make_pendulum(None, Some(0)).unwrap();
        let mut action_space = env.action_space().clone();

        let mut done = false;
        let mut steps = 0;

        env.reset();
        while !done {
            let a = action_space.sample().try_into().unwrap();
            let res = env.step(&a);
            done = res.done;
            steps += 1;
        }

        assert_eq!(steps, 200)
    }

    #[test]
    fn test_make_env_custom_steps() {
        let custom_steps = 10;
        let mut env = make_pendulum(Some(custom_steps), None).unwrap();

        let mut done = false;
        let mut steps = 0;

        env.reset();
        while !done {
            let res = env.step(&vec![0.0]);
            done = res.done;
            steps += 1;
        }

        assert_eq!(steps, custom_steps)
    }

    #[test]
    fn test_reward_is_never_positive() {
        let mut env = PendulumConfig::new().with_seed(Some(7)).init().unwrap();
        let low = env.reward_range().low;

        for ep in 0..5 {
            env.reset();
            for i in 0..200 {
                let torque = ((i + ep) as f32 * 0.37).sin() * 3.0;
                let res = env.step(&vec![torque]);
                assert!(res.reward <= 0.0);
                assert!(res.reward >= low);
                assert!(!res.done);
            }
        }
    }

    #[test]
    fn test_torque_is_clamped() {
        let mut env = PendulumConfig::new().with_seed(Some(0)).init().unwrap();
        env.step(&vec![10.0]);
        assert_eq!(env.last_torque(), 2.0);
        env.step(&vec![-10.0]);
        assert_eq!(env.last_torque(), -2.0);
    }

    #[test]
    fn test_upright_and_still_costs_only_torque() {
        let mut env = PendulumConfig::new().with_seed(Some(0)).init().unwrap();
        env.state = vec![0.0, 0.0];

        let res = env.step(&vec![1.0]);
        assert_approx_eq!(res.reward, -0.001, 1e-9);
        assert_approx_eq!(res.obs[2], 3.0 * 0.05, 1e-6);

        env.state = vec![PI, 0.0];
        let res = env.step(&vec![0.0]);
        assert_approx_eq!(res.reward as f32, -(PI * PI), 1e-4);
    }
}
