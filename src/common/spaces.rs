use std::collections::BTreeMap;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::common::errors::{GymError, Result};

/// Defines a space in which an action, observation, or other may exist.
///
/// The set of space kinds is closed: consumers match on the variant instead of
/// probing runtime types, so adding a kind is a compile-time checked change.
/// Every variant owns its own random generator, so sampling needs `&mut self`
/// while the domain itself never changes after construction.
#[derive(Debug, Clone)]
pub enum Space {
    Discrete(Discrete),
    Box(BoxSpace),
    MultiBinary(MultiBinary),
    MultiDiscrete(MultiDiscrete),
    Dict(DictSpace),
    Tuple(TupleSpace),
}

/// A value drawn from, or tested against, a [`Space`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpaceValue {
    Discrete(usize),
    Box(Vec<f32>),
    MultiBinary(Vec<bool>),
    MultiDiscrete(Vec<usize>),
    Dict(BTreeMap<String, SpaceValue>),
    Tuple(Vec<SpaceValue>),
}

impl SpaceValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SpaceValue::Discrete(_) => "Discrete",
            SpaceValue::Box(_) => "Box",
            SpaceValue::MultiBinary(_) => "MultiBinary",
            SpaceValue::MultiDiscrete(_) => "MultiDiscrete",
            SpaceValue::Dict(_) => "Dict",
            SpaceValue::Tuple(_) => "Tuple",
        }
    }
}

impl Space {
    /// tests whether the sample is contained within the space
    pub fn contains(&self, value: &SpaceValue) -> bool {
        match (self, value) {
            (Space::Discrete(s), SpaceValue::Discrete(v)) => s.contains(v),
            (Space::Box(s), SpaceValue::Box(v)) => s.contains(v),
            (Space::MultiBinary(s), SpaceValue::MultiBinary(v)) => s.contains(v),
            (Space::MultiDiscrete(s), SpaceValue::MultiDiscrete(v)) => s.contains(v),
            (Space::Dict(s), SpaceValue::Dict(v)) => s.contains(v),
            (Space::Tuple(s), SpaceValue::Tuple(v)) => s.contains(v),
            _ => false,
        }
    }

    /// randomly samples from the space
    pub fn sample(&mut self) -> SpaceValue {
        match self {
            Space::Discrete(s) => SpaceValue::Discrete(s.sample()),
            Space::Box(s) => SpaceValue::Box(s.sample()),
            Space::MultiBinary(s) => SpaceValue::MultiBinary(s.sample()),
            Space::MultiDiscrete(s) => SpaceValue::MultiDiscrete(s.sample()),
            Space::Dict(s) => SpaceValue::Dict(s.sample()),
            Space::Tuple(s) => SpaceValue::Tuple(s.sample()),
        }
    }

    pub fn seed(&mut self, seed: u64) {
        match self {
            Space::Discrete(s) => s.seed(seed),
            Space::Box(s) => s.seed(seed),
            Space::MultiBinary(s) => s.seed(seed),
            Space::MultiDiscrete(s) => s.seed(seed),
            Space::Dict(s) => s.seed(seed),
            Space::Tuple(s) => s.seed(seed),
        }
    }

    /// returns the dimensions used to size models consuming this space
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Space::Discrete(s) => s.shape(),
            Space::Box(s) => s.shape(),
            Space::MultiBinary(s) => s.shape(),
            Space::MultiDiscrete(s) => s.shape(),
            Space::Dict(s) => s.shape(),
            Space::Tuple(s) => s.shape(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Space::Discrete(_) => "Discrete",
            Space::Box(_) => "Box",
            Space::MultiBinary(_) => "MultiBinary",
            Space::MultiDiscrete(_) => "MultiDiscrete",
            Space::Dict(_) => "Dict",
            Space::Tuple(_) => "Tuple",
        }
    }
}

/// Defines a Discrete Space.
///
/// A Discrete space is a space on `usize` where samples
/// are drawn uniformly from `[0, n)`.
#[derive(Debug, Clone)]
pub struct Discrete {
    /// The upper bound on the space
    n: usize,
    rng: StdRng,
}

impl Discrete {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(GymError::InvalidSpace(
                "Discrete space needs at least one element".to_string(),
            ));
        }

        Ok(Self {
            n,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn contains(&self, sample: &usize) -> bool {
        *sample < self.n
    }

    pub fn sample(&mut self) -> usize {
        self.rng.gen_range(0..self.n)
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.n]
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Defines a `BoxSpace`.
///
/// A `BoxSpace` is an axis-aligned hyper-rectangle over finite `f32`
/// vectors. Bounds are validated when the space is built, so a malformed
/// box never reaches the first `sample` call.
#[derive(Debug, Clone)]
pub struct BoxSpace {
    /// The lower bound on the space
    low: Vec<f32>,

    /// The upper bound on the space
    high: Vec<f32>,

    rng: StdRng,
}

impl BoxSpace {
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(GymError::InvalidSpace(format!(
                "low has {} dimensions but high has {}",
                low.len(),
                high.len()
            )));
        }

        for (i, (&l, &h)) in low.iter().zip(high.iter()).enumerate() {
            if !l.is_finite() || !h.is_finite() || !(h - l).is_finite() {
                return Err(GymError::InvalidSpace(format!(
                    "bounds of dimension {i} are not finite: [{l}, {h}]"
                )));
            }
            if l > h {
                return Err(GymError::InvalidSpace(format!(
                    "low is greater than high in dimension {i}: {l} > {h}"
                )));
            }
        }

        Ok(Self {
            low,
            high,
            rng: StdRng::from_entropy(),
        })
    }

    /// Builds a box where every coordinate shares the same bounds.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Result<Self> {
        Self::new(vec![low; dim], vec![high; dim])
    }

    pub fn low(&self) -> &[f32] {
        &self.low
    }

    pub fn high(&self) -> &[f32] {
        &self.high
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, sample: &[f32]) -> bool {
        if sample.len() != self.low.len() {
            return false;
        }

        sample
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&s, &l), &h)| l <= s && s <= h)
    }

    pub fn sample(&mut self) -> Vec<f32> {
        (0..self.low.len())
            .map(|i| self.rng.gen_range(self.low[i]..=self.high[i]))
            .collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// `n` independent fair bits.
#[derive(Debug, Clone)]
pub struct MultiBinary {
    n: usize,
    rng: StdRng,
}

impl MultiBinary {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn contains(&self, sample: &[bool]) -> bool {
        sample.len() == self.n
    }

    pub fn sample(&mut self) -> Vec<bool> {
        (0..self.n).map(|_| self.rng.gen_bool(0.5)).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.n]
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// A vector of discrete coordinates, coordinate `i` living in `[0, nvec[i])`.
#[derive(Debug, Clone)]
pub struct MultiDiscrete {
    nvec: Vec<usize>,
    rng: StdRng,
}

impl MultiDiscrete {
    pub fn new(nvec: Vec<usize>) -> Result<Self> {
        if let Some(i) = nvec.iter().position(|&n| n == 0) {
            return Err(GymError::InvalidSpace(format!(
                "MultiDiscrete coordinate {i} has no elements"
            )));
        }

        Ok(Self {
            nvec,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn nvec(&self) -> &[usize] {
        &self.nvec
    }

    pub fn contains(&self, sample: &[usize]) -> bool {
        sample.len() == self.nvec.len() && sample.iter().zip(&self.nvec).all(|(s, n)| s < n)
    }

    pub fn sample(&mut self) -> Vec<usize> {
        self.nvec
            .iter()
            .map(|&n| self.rng.gen_range(0..n))
            .collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.nvec.len()]
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Named sub-spaces. Iteration, and therefore seeding, follows key order.
#[derive(Debug, Clone)]
pub struct DictSpace {
    spaces: BTreeMap<String, Space>,
}

impl DictSpace {
    pub fn new(spaces: BTreeMap<String, Space>) -> Self {
        Self { spaces }
    }

    pub fn get(&self, key: &str) -> Option<&Space> {
        self.spaces.get(key)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn contains(&self, sample: &BTreeMap<String, SpaceValue>) -> bool {
        sample.len() == self.spaces.len()
            && self
                .spaces
                .iter()
                .all(|(k, s)| sample.get(k).is_some_and(|v| s.contains(v)))
    }

    pub fn sample(&mut self) -> BTreeMap<String, SpaceValue> {
        self.spaces
            .iter_mut()
            .map(|(k, s)| (k.clone(), s.sample()))
            .collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.spaces.len()]
    }

    pub fn seed(&mut self, seed: u64) {
        for (i, s) in self.spaces.values_mut().enumerate() {
            s.seed(seed.wrapping_add(i as u64 + 1));
        }
    }
}

/// Ordered sub-spaces.
#[derive(Debug, Clone)]
pub struct TupleSpace {
    spaces: Vec<Space>,
}

impl TupleSpace {
    pub fn new(spaces: Vec<Space>) -> Self {
        Self { spaces }
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn contains(&self, sample: &[SpaceValue]) -> bool {
        sample.len() == self.spaces.len()
            && self.spaces.iter().zip(sample).all(|(s, v)| s.contains(v))
    }

    pub fn sample(&mut self) -> Vec<SpaceValue> {
        self.spaces.iter_mut().map(|s| s.sample()).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.spaces.len()]
    }

    pub fn seed(&mut self, seed: u64) {
        for (i, s) in self.spaces.iter_mut().enumerate() {
            s.seed(seed.wrapping_add(i as u64 + 1));
        }
    }
}

impl From<Discrete> for Space {
    fn from(value: Discrete) -> Self {
        Space::Discrete(value)
    }
}

impl From<BoxSpace> for Space {
    fn from(value: BoxSpace) -> Self {
        Space::Box(value)
    }
}

impl From<MultiBinary> for Space {
    fn from(value: MultiBinary) -> Self {
        Space::MultiBinary(value)
    }
}

impl From<MultiDiscrete> for Space {
    fn from(value: MultiDiscrete) -> Self {
        Space::MultiDiscrete(value)
    }
}

impl From<DictSpace> for Space {
    fn from(value: DictSpace) -> Self {
        Space::Dict(value)
    }
}

impl From<TupleSpace> for Space {
    fn from(value: TupleSpace) -> Self {
        Space::Tuple(value)
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use crate::common::errors::GymError;

    use super::{
        BoxSpace, DictSpace, Discrete, MultiBinary, MultiDiscrete, Space, SpaceValue, TupleSpace,
    };

    #[test]
    fn test_discrete_space() {
        let mut space = Discrete::new(2).unwrap();

        assert_eq!(space.n(), 2);
        assert!(space.contains(&0));
        assert!(space.contains(&1));
        assert!(!space.contains(&2));

        let sample = space.sample();
        assert!((sample == 0) | (sample == 1))
    }

    #[test]
    fn test_discrete_samples_stay_in_range() {
        for n in [1, 2, 3, 7, 100] {
            let mut space = Discrete::new(n).unwrap();
            for _ in 0..500 {
                let s = space.sample();
                assert!(s < n);
                assert!(space.contains(&s));
            }
        }
    }

    #[test]
    fn test_empty_discrete_is_rejected() {
        assert!(matches!(Discrete::new(0), Err(GymError::InvalidSpace(_))));
    }

    #[test]
    fn test_box_f32_space() {
        let low = vec![0.0, -0.1, 0.1];
        let high = vec![1.0, 1.1, 0.9];

        let mut space = BoxSpace::new(low, high).unwrap();

        assert_eq!(space.dim(), 3);

        assert!(space.contains(&[0.0, 1.1, 0.3]));
        assert!(!space.contains(&[30.0, 1.1, 0.3]));

        for _ in 0..500 {
            let sample = space.sample();
            assert_eq!(sample.len(), 3);
            for i in 0..3 {
                assert!(space.low()[i] <= sample[i] && sample[i] <= space.high()[i]);
            }
            assert!(space.contains(&sample));
        }
    }

    #[test]
    fn test_box_rejects_wrong_dimension() {
        let space = BoxSpace::uniform(3, -1.0, 1.0).unwrap();

        assert!(!space.contains(&[0.0, 0.0]));
        assert!(!space.contains(&[0.0, 0.0, 0.0, 0.0]));
        assert!(!space.contains(&[]));
    }

    #[test]
    fn test_box_validates_at_construction() {
        assert!(matches!(
            BoxSpace::new(vec![0.0, 0.0], vec![1.0]),
            Err(GymError::InvalidSpace(_))
        ));
        assert!(matches!(
            BoxSpace::new(vec![1.0], vec![0.0]),
            Err(GymError::InvalidSpace(_))
        ));
        assert!(matches!(
            BoxSpace::new(vec![f32::NEG_INFINITY], vec![0.0]),
            Err(GymError::InvalidSpace(_))
        ));
        assert!(matches!(
            BoxSpace::new(vec![-f32::MAX], vec![f32::MAX]),
            Err(GymError::InvalidSpace(_))
        ));
    }

    #[test]
    fn test_degenerate_box_samples_its_point() {
        let mut space = BoxSpace::new(vec![0.5], vec![0.5]).unwrap();
        assert_eq!(space.sample(), vec![0.5]);
    }

    #[test]
    fn test_multi_spaces() {
        let mut mb = MultiBinary::new(4);
        let s = mb.sample();
        assert_eq!(s.len(), 4);
        assert!(mb.contains(&s));
        assert!(!mb.contains(&[true]));

        let mut md = MultiDiscrete::new(vec![2, 3, 5]).unwrap();
        for _ in 0..200 {
            let s = md.sample();
            assert!(md.contains(&s));
        }
        assert!(!md.contains(&[1, 3, 0]));
        assert!(!md.contains(&[1, 2]));
        assert_eq!(md.shape(), vec![3]);
        assert!(MultiDiscrete::new(vec![2, 0]).is_err());
    }

    #[test]
    fn test_composite_spaces() {
        let mut children = BTreeMap::new();
        children.insert(
            "position".to_string(),
            Space::from(BoxSpace::uniform(2, -1.0, 1.0).unwrap()),
        );
        children.insert("mode".to_string(), Space::from(Discrete::new(3).unwrap()));
        let mut dict = Space::from(DictSpace::new(children));

        for _ in 0..100 {
            let v = dict.sample();
            assert!(dict.contains(&v));
        }

        let mut bad = BTreeMap::new();
        bad.insert("position".to_string(), SpaceValue::Box(vec![0.0, 0.0]));
        bad.insert("mode".to_string(), SpaceValue::Discrete(3));
        assert!(!dict.contains(&SpaceValue::Dict(bad.clone())));

        bad.insert("mode".to_string(), SpaceValue::Discrete(2));
        assert!(dict.contains(&SpaceValue::Dict(bad.clone())));

        bad.insert("extra".to_string(), SpaceValue::Discrete(0));
        assert!(!dict.contains(&SpaceValue::Dict(bad)));

        let mut tuple = Space::from(TupleSpace::new(vec![
            Space::from(Discrete::new(2).unwrap()),
            Space::from(MultiBinary::new(3)),
        ]));
        let v = tuple.sample();
        assert!(tuple.contains(&v));
        assert!(!tuple.contains(&SpaceValue::Tuple(vec![SpaceValue::Discrete(0)])));
        assert_eq!(tuple.shape(), vec![2]);
    }

    #[test]
    fn test_mismatched_kind_is_rejected() {
        let space = Space::from(Discrete::new(4).unwrap());
        assert!(!space.contains(&SpaceValue::Box(vec![0.0])));
    }

    #[test]
    fn test_seeding_is_reproducible() {
        let mut a = Space::from(BoxSpace::uniform(4, -2.0, 2.0).unwrap());
        let mut b = a.clone();
        a.seed(7);
        b.seed(7);

        for _ in 0..10 {
            assert_eq!(a.sample(), b.sample());
        }
    }
}
