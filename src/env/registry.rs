//! Process-wide table of environments constructible by id, e.g.
//! `make("CartPole-v1")`.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

use log::debug;

use crate::common::errors::{GymError, Result};

use super::{
    arcade::{
        breakout::BreakoutConfig, pong::PongConfig, space_invaders::SpaceInvadersConfig,
        Framebuffer, MAX_ARCADE_STEPS,
    },
    base::{Env, EnvSpec},
    classic_control::{
        acrobot::AcrobotConfig,
        cartpole::CartPoleConfig,
        mountain_car::MountainCarConfig,
        mountain_car_continuous::MountainCarContinuousConfig,
        pendulum::{make_pendulum, DEFAULT_MAX_STEPS},
    },
    toy_text::{cliff_walking::CliffWalkingConfig, frozen_lake::FrozenLakeConfig},
};

/// A freshly built environment of one of the supported shape families.
#[derive(Clone)]
pub enum AnyEnv {
    /// Vector observations, discrete actions.
    DiscreteControl(Box<dyn Env<Vec<f32>, usize>>),
    /// Vector observations, vector actions.
    ContinuousControl(Box<dyn Env<Vec<f32>, Vec<f32>>>),
    /// RGB frames, discrete actions.
    Arcade(Box<dyn Env<Framebuffer, usize>>),
    /// Integer states, discrete actions.
    ToyText(Box<dyn Env<usize, usize>>),
}

impl AnyEnv {
    pub fn kind(&self) -> &'static str {
        match self {
            AnyEnv::DiscreteControl(_) => DISCRETE_CONTROL,
            AnyEnv::ContinuousControl(_) => CONTINUOUS_CONTROL,
            AnyEnv::Arcade(_) => ARCADE,
            AnyEnv::ToyText(_) => TOY_TEXT,
        }
    }

    pub fn spec(&self) -> Option<EnvSpec> {
        match self {
            AnyEnv::DiscreteControl(env) => env.spec(),
            AnyEnv::ContinuousControl(env) => env.spec(),
            AnyEnv::Arcade(env) => env.spec(),
            AnyEnv::ToyText(env) => env.spec(),
        }
    }
}

const DISCRETE_CONTROL: &str = "DiscreteControl";
const CONTINUOUS_CONTROL: &str = "ContinuousControl";
const ARCADE: &str = "Arcade";
const TOY_TEXT: &str = "ToyText";

/// Boxed environments that can be pulled out of an [`AnyEnv`].
pub trait FromAnyEnv: Sized {
    const KIND: &'static str;

    /// Returns the env back unchanged when it belongs to another family.
    fn from_any(env: AnyEnv) -> std::result::Result<Self, AnyEnv>;
}

macro_rules! impl_from_any_env {
    ($variant:ident, $kind:expr, $o:ty, $a:ty) => {
        impl FromAnyEnv for Box<dyn Env<$o, $a>> {
            const KIND: &'static str = $kind;

            fn from_any(env: AnyEnv) -> std::result::Result<Self, AnyEnv> {
                match env {
                    AnyEnv::$variant(env) => Ok(env),
                    other => Err(other),
                }
            }
        }

        impl From<Box<dyn Env<$o, $a>>> for AnyEnv {
            fn from(env: Box<dyn Env<$o, $a>>) -> Self {
                AnyEnv::$variant(env)
            }
        }
    };
}

impl_from_any_env!(DiscreteControl, DISCRETE_CONTROL, Vec<f32>, usize);
impl_from_any_env!(ContinuousControl, CONTINUOUS_CONTROL, Vec<f32>, Vec<f32>);
impl_from_any_env!(Arcade, ARCADE, Framebuffer, usize);
impl_from_any_env!(ToyText, TOY_TEXT, usize, usize);

pub type EnvFactory = Arc<dyn Fn() -> Result<AnyEnv> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    spec: EnvSpec,
    factory: EnvFactory,
}

static REGISTRY: LazyLock<RwLock<HashMap<String, Entry>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Registers `factory` under `id`, replacing any previous entry.
pub fn register<F>(id: &str, spec: EnvSpec, factory: F) -> Result<()>
where
    F: Fn() -> Result<AnyEnv> + Send + Sync + 'static,
{
    let mut registry = REGISTRY.write().map_err(|_| GymError::RegistryPoisoned)?;
    let replaced = registry
        .insert(
            id.to_string(),
            Entry {
                spec,
                factory: Arc::new(factory),
            },
        )
        .is_some();

    debug!("registered environment {id} (replaced: {replaced})");

    Ok(())
}

/// Builds a new instance of the environment registered under `id`.
pub fn make(id: &str) -> Result<AnyEnv> {
    // the factory runs outside the lock so it may itself use the registry
    let factory = {
        let registry = REGISTRY.read().map_err(|_| GymError::RegistryPoisoned)?;
        registry
            .get(id)
            .map(|entry| entry.factory.clone())
            .ok_or_else(|| GymError::NotFound(id.to_string()))?
    };

    let env = factory()?;
    debug!("made environment {id} ({})", env.kind());

    Ok(env)
}

/// Like [`make`], but fails with [`GymError::TypeMismatch`] unless the env has
/// observation type `O` and action type `A`.
pub fn make_typed<O, A>(id: &str) -> Result<Box<dyn Env<O, A>>>
where
    Box<dyn Env<O, A>>: FromAnyEnv,
{
    <Box<dyn Env<O, A>> as FromAnyEnv>::from_any(make(id)?).map_err(|env| GymError::TypeMismatch {
        id: id.to_string(),
        expected: <Box<dyn Env<O, A>> as FromAnyEnv>::KIND,
        found: env.kind(),
    })
}

/// Every registered id, sorted.
pub fn list() -> Result<Vec<String>> {
    let registry = REGISTRY.read().map_err(|_| GymError::RegistryPoisoned)?;
    let mut ids: Vec<String> = registry.keys().cloned().collect();
    ids.sort();

    Ok(ids)
}

pub fn spec(id: &str) -> Result<EnvSpec> {
    let registry = REGISTRY.read().map_err(|_| GymError::RegistryPoisoned)?;
    registry
        .get(id)
        .map(|entry| entry.spec.clone())
        .ok_or_else(|| GymError::NotFound(id.to_string()))
}

/// Registers every built-in environment. Calling it again re-registers the
/// same entries.
pub fn register_all() -> Result<()> {
    register(
        "CartPole-v1",
        EnvSpec::new("CartPole-v1")
            .with_max_episode_steps(500)
            .with_reward_threshold(475.0),
        || Ok(AnyEnv::DiscreteControl(Box::new(CartPoleConfig::new().init()?))),
    )?;
    register(
        "Pendulum-v1",
        EnvSpec::new("Pendulum-v1").with_max_episode_steps(DEFAULT_MAX_STEPS),
        || Ok(make_pendulum(None, None)?.into()),
    )?;
    register(
        "Acrobot-v1",
        EnvSpec::new("Acrobot-v1")
            .with_max_episode_steps(500)
            .with_reward_threshold(-100.0),
        || Ok(AnyEnv::DiscreteControl(Box::new(AcrobotConfig::new().init()?))),
    )?;
    register(
        "MountainCar-v0",
        EnvSpec::new("MountainCar-v0")
            .with_max_episode_steps(200)
            .with_reward_threshold(-110.0),
        || Ok(AnyEnv::DiscreteControl(Box::new(MountainCarConfig::new().init()?))),
    )?;
    register(
        "MountainCarContinuous-v0",
        EnvSpec::new("MountainCarContinuous-v0")
            .with_max_episode_steps(999)
            .with_reward_threshold(90.0),
        || Ok(AnyEnv::ContinuousControl(Box::new(MountainCarContinuousConfig::new().init()?))),
    )?;
    register(
        "Pong-v4",
        EnvSpec::new("Pong-v4").with_max_episode_steps(MAX_ARCADE_STEPS),
        || Ok(AnyEnv::Arcade(Box::new(PongConfig::new().init()?))),
    )?;
    register(
        "Breakout-v4",
        EnvSpec::new("Breakout-v4").with_max_episode_steps(MAX_ARCADE_STEPS),
        || Ok(AnyEnv::Arcade(Box::new(BreakoutConfig::new().init()?))),
    )?;
    register(
        "SpaceInvaders-v4",
        EnvSpec::new("SpaceInvaders-v4").with_max_episode_steps(MAX_ARCADE_STEPS),
        || Ok(AnyEnv::Arcade(Box::new(SpaceInvadersConfig::new().init()?))),
    )?;
    register(
        "FrozenLake-v1",
        EnvSpec::new("FrozenLake-v1")
            .with_max_episode_steps(100)
            .with_reward_threshold(0.7),
        || Ok(AnyEnv::ToyText(Box::new(FrozenLakeConfig::new().init()?))),
    )?;
    register(
        "CliffWalking-v0",
        EnvSpec::new("CliffWalking-v0").with_max_episode_steps(100),
        || Ok(AnyEnv::ToyText(Box::new(CliffWalkingConfig::new().init()?))),
    )?;

    Ok(())
}
