use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

/// Environment mapping handed to a spawned interpreter. Keys are unique
/// and insertion order is preserved.
pub type EnvMap = IndexMap<String, String>;

/// Subdirectory of the package root that holds per-root user-site
/// installs, the Python analogue of `node_modules`.
pub const PYTHON_MODULES_DIR: &str = "python_modules";

/// Variable the interpreter reads as its user-site base directory.
pub const USER_BASE_VAR: &str = "PYTHONUSERBASE";

/// Set non-empty, this variable makes the interpreter ignore the user
/// base entirely, so it must not survive into the child environment.
const NO_USER_SITE_VAR: &str = "PYTHONNOUSERSITE";

/// Build the interpreter environment for a package root: `base_env`
/// with `PYTHONUSERBASE` pinned under the root and `PYTHONNOUSERSITE`
/// stripped. The input map is never mutated.
pub fn python_env(package_dir: &Path, base_env: &EnvMap) -> EnvMap {
    let user_base = package_dir.join(PYTHON_MODULES_DIR);
    let mut env = base_env.clone();
    env.shift_remove(NO_USER_SITE_VAR);
    env.insert(USER_BASE_VAR.to_string(), user_base.display().to_string());
    debug!(user_base = %user_base.display(), "pinned python user base");
    env
}
