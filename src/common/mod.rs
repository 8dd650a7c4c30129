pub mod agent;
pub mod convert;
pub mod errors;
pub mod eval;
pub mod spaces;
pub mod to_tensor;
pub mod utils;
pub mod vec_env;
