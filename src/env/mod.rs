pub mod arcade;
pub mod base;
pub mod classic_control;
pub mod probe;
pub mod registry;
pub mod render;
pub mod toy_text;
pub mod wrappers;
