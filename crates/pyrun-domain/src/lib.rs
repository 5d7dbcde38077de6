#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod interpreter_args;
pub mod python_env;

pub use interpreter_args::find_source_arg;
pub use python_env::{python_env, EnvMap, PYTHON_MODULES_DIR, USER_BASE_VAR};
