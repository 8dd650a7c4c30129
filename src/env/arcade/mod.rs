//! Raster arcade games drawn on a [`Framebuffer`].
//!
//! Each step runs in a fixed order: apply the action, move entities, resolve
//! wall collisions, resolve entity collisions and scoring, check termination,
//! then redraw the whole frame.

pub mod breakout;
mod framebuffer;
pub mod pong;
pub mod space_invaders;

pub use framebuffer::{
    Framebuffer, Rgb, BLACK, BLUE, CYAN, GREEN, MAGENTA, ORANGE, PURPLE, RED, WHITE, YELLOW,
};

use crate::common::{
    errors::Result,
    spaces::{BoxSpace, Space},
};

use super::{base::Metadata, render::RenderMode};

/// Every arcade game caps its episodes at this many steps.
pub const MAX_ARCADE_STEPS: usize = 10_000;

pub(crate) fn screen_space() -> Result<Space> {
    Ok(BoxSpace::uniform(Framebuffer::LEN, 0.0, 255.0)?.into())
}

pub(crate) fn arcade_metadata() -> Metadata {
    Metadata {
        render_modes: vec![RenderMode::Human, RenderMode::RgbArray],
        render_fps: Some(60),
    }
}
