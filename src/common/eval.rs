use burn::config::Config;
use core::fmt::Debug;
use log::info;

use crate::{
    common::{errors::Result, utils::mean},
    env::base::Env,
};

use super::agent::Agent;

#[derive(Clone, Debug)]
pub struct EvalResult {
    pub mean_len: f64,
    pub mean_reward: f64,
    pub episode_rewards: Vec<f64>,
    pub episode_lengths: Vec<usize>,
}

#[derive(Config)]
pub struct EvalConfig {
    #[config(default = 10)]
    pub n_eval_episodes: usize,
    /// Ask the agent for its best action instead of exploring.
    #[config(default = true)]
    pub greedy: bool,
    /// Cuts episodes of envs that never finish on their own.
    pub max_episode_steps: Option<usize>,
    #[config(default = false)]
    pub print_obs: bool,
    #[config(default = false)]
    pub print_action: bool,
    #[config(default = false)]
    pub print_reward: bool,
    #[config(default = false)]
    pub print_done: bool,
}

/// Runs `agent` on `env` for `cfg.n_eval_episodes` full episodes and reports
/// the mean return and length.
pub fn evaluate_policy<O: Clone + Debug, A: Debug>(
    agent: &mut dyn Agent<O, A>,
    env: &mut dyn Env<O, A>,
    cfg: &EvalConfig,
) -> Result<EvalResult> {
    let mut episode_rewards = Vec::with_capacity(cfg.n_eval_episodes);
    let mut episode_lengths = Vec::with_capacity(cfg.n_eval_episodes);

    let mut state = env.reset();
    let mut running_reward = 0.0;
    let mut ep_len = 0;

    info!("starting evaluation over {} episodes", cfg.n_eval_episodes);

    while episode_rewards.len() < cfg.n_eval_episodes {
        if cfg.print_obs {
            println!("state: {:?}", state);
        }

        let action = agent.act(&state, cfg.greedy)?;

        if cfg.print_action {
            println!("action: {:?}", action);
        }

        let step_sample = env.step(&action);

        running_reward += step_sample.reward;
        ep_len += 1;
        let cut = cfg.max_episode_steps.is_some_and(|m| ep_len >= m);
        let done = step_sample.done || cut;

        if cfg.print_reward {
            println!("reward: {:?}", step_sample.reward);
        }

        if cfg.print_done {
            println!("done: {:?}", done);
        }

        if done {
            episode_rewards.push(running_reward);
            episode_lengths.push(ep_len);

            running_reward = 0.0;
            ep_len = 0;

            state = env.reset();
        } else {
            state = step_sample.obs;
        }
    }

    let lengths: Vec<f64> = episode_lengths.iter().map(|l| *l as f64).collect();
    let result = EvalResult {
        mean_len: mean(&lengths),
        mean_reward: mean(&episode_rewards),
        episode_rewards,
        episode_lengths,
    };

    info!(
        "evaluation done: mean reward {:.3}, mean length {:.1}",
        result.mean_reward, result.mean_len
    );

    Ok(result)
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;

    use crate::{
        common::{
            agent::{Agent, RandomAgent},
            errors::Result,
        },
        env::{
            base::Env,
            classic_control::pendulum::PendulumConfig,
            probe::DummyEnv,
            toy_text::{frozen_lake::FrozenLakeConfig, DOWN, RIGHT},
        },
    };

    use super::{evaluate_policy, EvalConfig};

    struct Constant(usize);

    impl Agent<usize, usize> for Constant {
        fn act(&mut self, _obs: &usize, _greedy: bool) -> Result<usize> {
            Ok(self.0)
        }
    }

    struct LakeWalker;

    impl Agent<usize, usize> for LakeWalker {
        fn act(&mut self, obs: &usize, _greedy: bool) -> Result<usize> {
            // the shortest safe path on the default lake
            Ok(match obs {
                0 | 4 | 10 => DOWN,
                _ => RIGHT,
            })
        }
    }

    #[test]
    fn test_eval_dummy() {
        let mut env = DummyEnv::new().unwrap();
        let mut agent = Constant(4);

        let res = evaluate_policy(&mut agent, &mut env, &EvalConfig::new().with_n_eval_episodes(3))
            .unwrap();

        // 4 + 8 + 12 over three steps, every episode
        assert_eq!(res.episode_lengths, vec![3, 3, 3]);
        assert_approx_eq!(res.mean_reward, 24.0);
        assert_approx_eq!(res.mean_len, 3.0);
    }

    #[test]
    fn test_eval_solves_frozen_lake() {
        let mut env = FrozenLakeConfig::new().init().unwrap();
        let res = evaluate_policy(&mut LakeWalker, &mut env, &EvalConfig::new()).unwrap();

        assert_eq!(res.episode_rewards, vec![1.0; 10]);
        assert_approx_eq!(res.mean_len, 6.0);
    }

    #[test]
    fn test_eval_cuts_endless_episodes() {
        let mut env = PendulumConfig::new().with_seed(Some(0)).init().unwrap();
        let mut agent = RandomAgent::new(env.action_space().clone(), Some(0));

        let cfg = EvalConfig::new()
            .with_n_eval_episodes(2)
            .with_max_episode_steps(Some(50));
        let res = evaluate_policy(&mut agent, &mut env, &cfg).unwrap();

        assert_eq!(res.episode_lengths, vec![50, 50]);
        assert!(res.mean_reward < 0.0);
    }
}
