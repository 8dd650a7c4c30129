use crate::{
    common::{
        errors::{GymError, Result},
        spaces::{Space, SpaceValue},
    },
    env::base::{Env, EnvObservation},
};

/// `Agent` is anything that picks actions for an environment.
///
/// The observation and action types match the environment's, so an agent
/// built for `Env<O, A>` can drive any env (or wrapper chain) of that shape.
pub trait Agent<O, A> {
    /// Ask the agent for an action.
    ///
    /// `greedy` asks for the agent's best action with no exploration.
    fn act(&mut self, obs: &O, greedy: bool) -> Result<A>;

    /// Feeds back the transition produced by acting on `obs`. Agents that do
    /// not learn online can ignore it.
    fn learn(&mut self, _obs: &O, _action: &A, _step: &EnvObservation<O>) {}
}

/// Builds agents for a given environment, reading whatever it needs (spaces,
/// spec) from the env.
pub trait AgentFactory<O, A> {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn create(&self, env: &dyn Env<O, A>) -> Result<Box<dyn Agent<O, A>>>;
}

/// Samples uniformly from the action space and ignores observations.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    action_space: Space,
}

impl RandomAgent {
    pub fn new(action_space: Space, seed: Option<u64>) -> Self {
        let mut action_space = action_space;
        if let Some(seed) = seed {
            action_space.seed(seed);
        }

        Self { action_space }
    }
}

impl<O, A> Agent<O, A> for RandomAgent
where
    A: TryFrom<SpaceValue, Error = GymError>,
{
    fn act(&mut self, _obs: &O, _greedy: bool) -> Result<A> {
        self.action_space.sample().try_into()
    }
}

/// Hands out [`RandomAgent`]s, optionally seeded.
#[derive(Clone, Debug, Default)]
pub struct RandomAgentFactory {
    pub seed: Option<u64>,
}

impl<O, A> AgentFactory<O, A> for RandomAgentFactory
where
    A: TryFrom<SpaceValue, Error = GymError> + 'static,
    O: 'static,
{
    fn name(&self) -> &str {
        "Random"
    }

    fn description(&self) -> &str {
        "uniformly random actions"
    }

    fn create(&self, env: &dyn Env<O, A>) -> Result<Box<dyn Agent<O, A>>> {
        let agent = RandomAgent::new(env.action_space().clone(), self.seed);

        // fail here rather than on the first step if the space cannot produce `A`
        A::try_from(agent.action_space.clone().sample())?;

        Ok(Box::new(agent))
    }
}
