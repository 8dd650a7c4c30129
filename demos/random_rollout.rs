extern crate gym_burn;

use std::fmt::Debug;

use gym_burn::{
    common::{
        agent::RandomAgent,
        errors::GymError,
        eval::{evaluate_policy, EvalConfig},
        spaces::SpaceValue,
    },
    env::{
        base::Env,
        registry::{list, make, register_all, AnyEnv},
        wrappers::RecordEpisodeStatistics,
    },
};

fn rollout<O, A>(id: &str, env: Box<dyn Env<O, A>>) -> anyhow::Result<()>
where
    O: Clone + Debug + 'static,
    A: Clone + Debug + TryFrom<SpaceValue, Error = GymError> + 'static,
{
    let mut env = RecordEpisodeStatistics::new(env);
    env.seed(Some(0));
    let mut agent = RandomAgent::new(env.action_space().clone(), Some(0));

    let cfg = EvalConfig::new()
        .with_n_eval_episodes(3)
        .with_max_episode_steps(Some(1000));
    let res = evaluate_policy(&mut agent, &mut env, &cfg)?;

    println!(
        "{id:<26} mean reward {:>9.2}  mean length {:>7.1}",
        res.mean_reward, res.mean_len
    );

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    register_all()?;

    for id in list()? {
        match make(&id)? {
            AnyEnv::DiscreteControl(env) => rollout(&id, env)?,
            AnyEnv::ContinuousControl(env) => rollout(&id, env)?,
            AnyEnv::Arcade(env) => rollout(&id, env)?,
            AnyEnv::ToyText(env) => rollout(&id, env)?,
        }
    }

    Ok(())
}
