use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Manifest file whose presence marks a package root. Contents are
/// never parsed; the check is presence-only.
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Where to find the package root for an invocation.
#[derive(Clone, Debug)]
pub enum PackageDirSpec {
    /// An already-known package root, returned verbatim without
    /// touching the filesystem.
    Explicit(PathBuf),
    /// A file or directory to search upward from.
    Search(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum PackageDirError {
    #[error("Could not find directory containing package.json")]
    NotFound,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Resolve the package root for `spec`.
///
/// A search walks upward one directory at a time, starting at the
/// search path itself (or its parent when the path names an existing
/// file), until a directory containing [`PACKAGE_MANIFEST`] is found.
///
/// # Errors
///
/// Fails with [`PackageDirError::NotFound`] when the walk reaches the
/// filesystem root without finding a manifest.
pub async fn find_package_dir(spec: &PackageDirSpec) -> Result<PathBuf, PackageDirError> {
    let search_path = match spec {
        PackageDirSpec::Explicit(dir) => return Ok(dir.clone()),
        PackageDirSpec::Search(path) => path,
    };
    let mut dir = search_start(search_path).await?;
    loop {
        if tokio::fs::try_exists(dir.join(PACKAGE_MANIFEST)).await? {
            debug!(package_dir = %dir.display(), "found package root");
            return Ok(dir);
        }
        // `pop` returns false once the path is the filesystem root.
        if !dir.pop() {
            return Err(PackageDirError::NotFound);
        }
    }
}

async fn search_start(path: &Path) -> Result<PathBuf, PackageDirError> {
    let absolute = normalize(&std::path::absolute(path)?);
    match tokio::fs::metadata(&absolute).await {
        Ok(meta) if meta.is_file() => Ok(absolute
            .parent()
            .map_or_else(|| absolute.clone(), Path::to_path_buf)),
        _ => Ok(absolute),
    }
}

/// Lexical cleanup only: drop `.` components so the walk compares and
/// pops real directory names. `..` is left for the walk itself.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}
