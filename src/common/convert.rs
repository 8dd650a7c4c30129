//! Conversions between the concrete observation/action payloads used by the
//! environments (`usize`, `f32`, `Vec<f32>`, [`Framebuffer`], ...) and the
//! space-level [`SpaceValue`].
//!
//! This is the one place payload shapes are bridged to spaces; agents and
//! wrappers go through here instead of matching on value kinds themselves.

use crate::{
    common::{
        errors::{GymError, Result},
        spaces::SpaceValue,
    },
    env::arcade::Framebuffer,
};

/// Views a payload as a member candidate of a space.
pub trait ToSpaceValue {
    fn to_space_value(&self) -> SpaceValue;
}

impl ToSpaceValue for usize {
    fn to_space_value(&self) -> SpaceValue {
        SpaceValue::Discrete(*self)
    }
}

impl ToSpaceValue for f32 {
    fn to_space_value(&self) -> SpaceValue {
        SpaceValue::Box(vec![*self])
    }
}

impl ToSpaceValue for Vec<f32> {
    fn to_space_value(&self) -> SpaceValue {
        SpaceValue::Box(self.clone())
    }
}

impl ToSpaceValue for Vec<bool> {
    fn to_space_value(&self) -> SpaceValue {
        SpaceValue::MultiBinary(self.clone())
    }
}

impl ToSpaceValue for Vec<usize> {
    fn to_space_value(&self) -> SpaceValue {
        SpaceValue::MultiDiscrete(self.clone())
    }
}

impl ToSpaceValue for Framebuffer {
    fn to_space_value(&self) -> SpaceValue {
        SpaceValue::Box(self.as_bytes().iter().map(|&b| b as f32).collect())
    }
}

impl ToSpaceValue for SpaceValue {
    fn to_space_value(&self) -> SpaceValue {
        self.clone()
    }
}

fn mismatch(expected: &'static str, value: &SpaceValue) -> GymError {
    GymError::ValueMismatch {
        expected,
        found: value.kind(),
    }
}

impl TryFrom<SpaceValue> for usize {
    type Error = GymError;

    fn try_from(value: SpaceValue) -> Result<Self> {
        match value {
            SpaceValue::Discrete(v) => Ok(v),
            other => Err(mismatch("Discrete", &other)),
        }
    }
}

impl TryFrom<SpaceValue> for f32 {
    type Error = GymError;

    fn try_from(value: SpaceValue) -> Result<Self> {
        match value {
            SpaceValue::Box(v) if v.len() == 1 => Ok(v[0]),
            other => Err(mismatch("one dimensional Box", &other)),
        }
    }
}

impl TryFrom<SpaceValue> for Vec<f32> {
    type Error = GymError;

    fn try_from(value: SpaceValue) -> Result<Self> {
        match value {
            SpaceValue::Box(v) => Ok(v),
            other => Err(mismatch("Box", &other)),
        }
    }
}

impl TryFrom<SpaceValue> for Vec<bool> {
    type Error = GymError;

    fn try_from(value: SpaceValue) -> Result<Self> {
        match value {
            SpaceValue::MultiBinary(v) => Ok(v),
            other => Err(mismatch("MultiBinary", &other)),
        }
    }
}

impl TryFrom<SpaceValue> for Vec<usize> {
    type Error = GymError;

    fn try_from(value: SpaceValue) -> Result<Self> {
        match value {
            SpaceValue::MultiDiscrete(v) => Ok(v),
            other => Err(mismatch("MultiDiscrete", &other)),
        }
    }
}
