//! Minimal git lookups: the project root and committed file contents.
//!
//! Both are best-effort. A missing `git` binary, a directory outside of a
//! repository, or an untracked file all come back as `None`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn git(cwd: &Path, args: &[&str]) -> Option<String> {
    if which::which("git").is_err() {
        log::debug!("git not found on PATH");
        return None;
    }

    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .ok()?;

    if !output.status.success() {
        log::debug!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    String::from_utf8(output.stdout).ok()
}

/// Top-level directory of the repository containing `cwd`.
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    git(cwd, &["rev-parse", "--show-toplevel"])
        .map(|out| PathBuf::from(out.trim()))
        .filter(|root| !root.as_os_str().is_empty())
}

/// Contents of `path` at `HEAD`, if the file is tracked.
pub fn committed_contents(root: &Path, path: &Path) -> Option<String> {
    let relative = relative_to_root(root, path)?;
    let object = format!("HEAD:{}", relative.to_string_lossy().replace('\\', "/"));
    git(root, &["show", &object])
}

/// `path` relative to `root`, resolving symlinks on the parts that exist.
fn relative_to_root(root: &Path, path: &Path) -> Option<PathBuf> {
    let root = fs::canonicalize(root).ok()?;
    let absolute = match fs::canonicalize(path) {
        Ok(path) => path,
        // The file may be deleted on disk but still committed.
        Err(_) => {
            let parent = fs::canonicalize(path.parent()?).ok()?;
            parent.join(path.file_name()?)
        }
    };

    absolute.strip_prefix(&root).ok().map(Path::to_path_buf)
}
