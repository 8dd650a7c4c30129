use std::mem;

use log::debug;

use crate::{
    common::{
        errors::{GymError, Result},
        spaces::Space,
        vec_env::base_env::{VecEnv, VecEnvObservation},
    },
    env::{
        base::{Env, RewardRange},
        registry::{make_typed, FromAnyEnv},
        render::RenderMode,
    },
};

/// Runs its envs one after another on the calling thread, in index order.
#[derive(Clone)]
pub struct DummyVecEnv<O, A> {
    envs: Vec<Box<dyn Env<O, A>>>,
    cached_obs: Option<VecEnvObservation<O>>,
}

impl<O, A> DummyVecEnv<O, A> {
    pub fn new(envs: Vec<Box<dyn Env<O, A>>>) -> Result<Self> {
        if envs.is_empty() {
            return Err(GymError::InvalidConfig(
                "a vectorised env needs at least one environment".into(),
            ));
        }

        Ok(Self {
            envs,
            cached_obs: None,
        })
    }

    /// Builds `n` envs with `factory`, handing env `i` the seed `seed + i`.
    pub fn from_fn<F>(n: usize, seed: Option<u64>, factory: F) -> Result<Self>
    where
        F: Fn(Option<u64>) -> Result<Box<dyn Env<O, A>>>,
    {
        let envs = (0..n)
            .map(|i| factory(seed.map(|s| s.wrapping_add(i as u64))))
            .collect::<Result<Vec<_>>>()?;

        Self::new(envs)
    }

    /// Builds `n` copies of a registered env, seeding env `i` with `seed + i`.
    pub fn from_registry(id: &str, n: usize, seed: Option<u64>) -> Result<Self>
    where
        Box<dyn Env<O, A>>: FromAnyEnv,
    {
        debug!("building {n} copies of {id}");

        Self::from_fn(n, seed, |s| {
            let mut env = make_typed::<O, A>(id)?;
            env.seed(s);
            Ok(env)
        })
    }

    pub fn envs(&self) -> &[Box<dyn Env<O, A>>] {
        &self.envs
    }
}

impl<O, A> VecEnv<O, A> for DummyVecEnv<O, A> {
    fn step_async(&mut self, actions: Vec<A>) -> Result<()> {
        if actions.len() != self.envs.len() {
            return Err(GymError::BatchSize {
                expected: self.envs.len(),
                got: actions.len(),
            });
        }

        let results = self
            .envs
            .iter_mut()
            .zip(actions.iter())
            .map(|(env, a)| env.step(a))
            .collect();

        self.cached_obs = Some(VecEnvObservation::new(results));

        Ok(())
    }

    fn step_wait(&mut self) -> Result<VecEnvObservation<O>> {
        mem::take(&mut self.cached_obs).ok_or(GymError::NoPendingStep)
    }

    fn reset(&mut self) -> Vec<O> {
        self.cached_obs = None;
        self.envs.iter_mut().map(|e| e.reset()).collect()
    }

    fn seed(&mut self, seed: Option<u64>) {
        for (i, env) in self.envs.iter_mut().enumerate() {
            env.seed(seed.map(|s| s.wrapping_add(i as u64)));
        }
    }

    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn action_space(&self) -> &Space {
        self.envs[0].action_space()
    }

    fn observation_space(&self) -> &Space {
        self.envs[0].observation_space()
    }

    fn reward_range(&self) -> RewardRange {
        self.envs[0].reward_range()
    }

    fn render(&self, mode: RenderMode) {
        self.envs[0].render(mode)
    }

    fn close(&mut self) {
        self.envs.iter_mut().for_each(|e| e.close());
    }
}

#[cfg(test)]
mod test {
    use crate::{
        common::{
            errors::GymError,
            vec_env::{base_env::VecEnv, dummy_vec_env::DummyVecEnv},
        },
        env::{
            base::Env,
            classic_control::cartpole::CartPoleConfig,
            probe::DummyEnv,
            registry::register_all,
        },
    };

    fn cartpoles(n: usize, seed: u64) -> DummyVecEnv<Vec<f32>, usize> {
        DummyVecEnv::from_fn(n, Some(seed), |s| {
            let env: Box<dyn Env<Vec<f32>, usize>> =
                Box::new(CartPoleConfig::new().with_seed(s).init()?);
            Ok(env)
        })
        .unwrap()
    }

    #[test]
    fn test_dummy_basic() {
        let mut vec_env = cartpoles(3, 0);
        let mut action_space = vec_env.action_space().clone();

        let reset_obs = vec_env.reset();
        assert_eq!(reset_obs.len(), 3);

        for _ in 0..10 {
            let act = (0..3)
                .map(|_| action_space.sample().try_into().unwrap())
                .collect();
            let obs = vec_env.step(act).unwrap();
            assert_eq!(obs.len(), 3);
            assert_eq!(obs.reward.len(), 3);
        }

        vec_env.close();
    }

    #[test]
    fn test_results_are_index_aligned() {
        let envs: Vec<Box<dyn Env<usize, usize>>> = (0..3)
            .map(|_| Box::new(DummyEnv::new().unwrap()) as Box<dyn Env<usize, usize>>)
            .collect();
        let mut vec_env = DummyVecEnv::new(envs).unwrap();
        vec_env.reset();

        let res = vec_env.step(vec![1, 2, 4]).unwrap();
        assert_eq!(res.obs, vec![1, 2, 4]);

        let res = vec_env.step(vec![0, 4, 4]).unwrap();
        assert_eq!(res.obs, vec![1, 6, 8]);
        assert_eq!(res.reward, vec![1.0, 6.0, 8.0]);
        assert_eq!(res.done, vec![false, false, false]);
    }

    #[test]
    fn test_envs_are_isolated() {
        // env 1 of the batch matches a lone env with the same seed, whatever
        // the other envs are fed
        let mut batch = cartpoles(3, 10);
        let mut lone = CartPoleConfig::new().with_seed(Some(11)).init().unwrap();

        let batch_obs = batch.reset();
        assert_eq!(batch_obs[1], lone.reset());

        for step in 0..20 {
            let res = batch.step(vec![step % 2, 1, 0]).unwrap();
            let lone_res = lone.step(&1);
            assert_eq!(res.obs[1], lone_res.obs);
            if lone_res.done {
                break;
            }
        }
    }

    #[test]
    fn test_wrong_batch_size() {
        let mut vec_env = cartpoles(2, 0);
        vec_env.reset();

        assert!(matches!(
            vec_env.step(vec![0]),
            Err(GymError::BatchSize {
                expected: 2,
                got: 1
            })
        ));
        assert!(matches!(vec_env.step_wait(), Err(GymError::NoPendingStep)));
    }

    #[test]
    fn test_largest_seed_wraps_around() {
        let mut batch = cartpoles(2, u64::MAX);
        let mut lone = CartPoleConfig::new().with_seed(Some(0)).init().unwrap();
        assert_eq!(batch.reset()[1], lone.reset());

        let envs: Vec<Box<dyn Env<usize, usize>>> = (0..3)
            .map(|_| Box::new(DummyEnv::new().unwrap()) as Box<dyn Env<usize, usize>>)
            .collect();
        let mut vec_env = DummyVecEnv::new(envs).unwrap();
        vec_env.seed(Some(u64::MAX));
        assert_eq!(vec_env.reset(), vec![0, 0, 0]);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let envs: Vec<Box<dyn Env<usize, usize>>> = vec![];
        assert!(DummyVecEnv::new(envs).is_err());
    }

    #[test]
    fn test_from_registry() {
        register_all().unwrap();

        let mut a = DummyVecEnv::<Vec<f32>, usize>::from_registry("CartPole-v1", 2, Some(5)).unwrap();
        let mut b = DummyVecEnv::<Vec<f32>, usize>::from_registry("CartPole-v1", 2, Some(5)).unwrap();
        assert_eq!(a.num_envs(), 2);

        let obs = a.reset();
        assert_eq!(obs, b.reset());
        assert_ne!(obs[0], obs[1]);

        assert!(DummyVecEnv::<Vec<f32>, Vec<f32>>::from_registry("CartPole-v1", 2, None).is_err());
    }
}
