//! Write extracted files under a base directory.
//!
//! Existing files are never overwritten: a target that already exists is
//! reported with `generated: false`. Every name is validated before the first
//! write, so a single escaping path leaves the tree untouched.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use super::types::{ApplyResult, ExtractedFile};

/// Error type for applying files.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("Refusing to write '{name}': it resolves outside of the base directory")]
    PathEscape { name: String },

    #[error("Invalid file name '{name}'")]
    InvalidName { name: String },

    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve `name` to a path under `base_dir`.
///
/// Absolute names and `..` components that climb above `base_dir` are
/// rejected. When part of the target already exists, the existing ancestor
/// must also canonicalize to somewhere under `base_dir`, which catches
/// symlinks pointing out of the tree.
pub fn resolve_target(base_dir: &Path, name: &str) -> Result<PathBuf, ApplyError> {
    if name.trim().is_empty() {
        return Err(ApplyError::InvalidName {
            name: name.to_string(),
        });
    }

    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(ApplyError::PathEscape {
                        name: name.to_string(),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ApplyError::PathEscape {
                    name: name.to_string(),
                })
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(ApplyError::InvalidName {
            name: name.to_string(),
        });
    }

    let target = base_dir.join(&relative);
    ensure_within(base_dir, &target, name)?;

    Ok(target)
}

fn ensure_within(base_dir: &Path, target: &Path, name: &str) -> Result<(), ApplyError> {
    let Ok(base) = fs::canonicalize(base_dir) else {
        // Nothing exists yet, so nothing can be a symlink.
        return Ok(());
    };

    let Some(existing) = target.ancestors().find(|p| p.symlink_metadata().is_ok()) else {
        return Ok(());
    };

    // A dangling symlink exists but does not canonicalize.
    match fs::canonicalize(existing) {
        Ok(path) if path.starts_with(&base) => Ok(()),
        _ => Err(ApplyError::PathEscape {
            name: name.to_string(),
        }),
    }
}

/// Write `files` under `base_dir`, returning one outcome per file in order.
pub fn apply(base_dir: &Path, files: &[ExtractedFile]) -> Result<Vec<ApplyResult>, ApplyError> {
    let targets = files
        .iter()
        .map(|file| resolve_target(base_dir, &file.name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut results = Vec::with_capacity(files.len());

    for (file, target) in files.iter().zip(targets) {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ApplyError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let generated = write_new(&target, &file.contents)?;
        if generated {
            log::debug!("wrote {}", target.display());
        } else {
            log::info!("skipping {}: file already exists", target.display());
        }

        results.push(ApplyResult {
            file: file.name.clone(),
            generated,
        });
    }

    Ok(results)
}

/// Create `target` and write `contents`. Returns `false` when any entry,
/// including a symlink, already occupies the path.
fn write_new(target: &Path, contents: &str) -> Result<bool, ApplyError> {
    let io_error = |source: std::io::Error| ApplyError::Io {
        path: target.to_path_buf(),
        source,
    };

    let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_error(e)),
    };

    file.write_all(contents.as_bytes()).map_err(io_error)?;
    Ok(true)
}
