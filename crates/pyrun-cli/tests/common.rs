#![allow(dead_code)]

use std::path::PathBuf;

pub fn find_python() -> Option<PathBuf> {
    which::which("python3")
        .or_else(|_| which::which("python"))
        .ok()
}
