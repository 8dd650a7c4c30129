pub mod base_env;
pub mod dummy_vec_env;
