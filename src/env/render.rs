use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::common::errors::GymError;

/// How `Env::render` should present the current state.
///
/// Rendering is always opt-in and never feeds back into `step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Write a short text description of the state to stdout.
    Human,
    /// The RGB frame. Arcade environments already return it as their
    /// observation, so rendering in this mode has no side effect.
    RgbArray,
}

impl FromStr for RenderMode {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(RenderMode::Human),
            "rgb_array" => Ok(RenderMode::RgbArray),
            other => Err(GymError::UnknownRenderMode(other.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Human => write!(f, "human"),
            RenderMode::RgbArray => write!(f, "rgb_array"),
        }
    }
}

pub(crate) fn render_header(name: &str) {
    println!("== {name} ==");
}

/// Draws a one line track with the car marked as `C`, used by the mountain car
/// family.
pub(crate) fn track_line(position: f32, min: f32, max: f32, width: usize) -> String {
    let frac = (position - min) / (max - min);
    let car = ((frac * (width - 1) as f32).round().max(0.0) as usize).min(width - 1);

    (0..width)
        .map(|i| if i == car { 'C' } else { '-' })
        .collect()
}

#[cfg(test)]
mod test {
    use crate::common::errors::GymError;

    use super::{track_line, RenderMode};

    #[test]
    fn test_parse_render_mode() {
        assert_eq!("human".parse::<RenderMode>().unwrap(), RenderMode::Human);
        assert_eq!(
            "rgb_array".parse::<RenderMode>().unwrap(),
            RenderMode::RgbArray
        );
        assert!(matches!(
            "ansi".parse::<RenderMode>(),
            Err(GymError::UnknownRenderMode(m)) if m == "ansi"
        ));
    }

    #[test]
    fn test_track_line() {
        assert_eq!(track_line(-1.2, -1.2, 0.6, 5), "C----");
        assert_eq!(track_line(0.6, -1.2, 0.6, 5), "----C");
        assert_eq!(track_line(5.0, -1.2, 0.6, 5).len(), 5);
    }
}
