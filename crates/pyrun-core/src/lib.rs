#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod package_dir;
pub mod spawn;

pub use package_dir::{find_package_dir, PackageDirError, PackageDirSpec, PACKAGE_MANIFEST};
pub use spawn::{
    resolve_interpreter, spawn_python, Interop, ProcessResult, SpawnError, SpawnOptions,
    PYTHON_ENV_VAR,
};
