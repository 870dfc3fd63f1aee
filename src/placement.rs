use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// How a file is transferred to its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transfer {
    /// The source is removed once the file is at its destination.
    Move,
    /// The source is left where it is.
    Copy,
}

impl Transfer {
    pub fn from_move_flag(move_files: bool) -> Self {
        if move_files { Self::Move } else { Self::Copy }
    }
}

/// The outcome of placing one file.
///
/// `Moved` and `Copied` always name the operation that actually happened on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementResult {
    Moved,
    Copied,
    /// The target already existed; nothing was done.
    Duplicate,
    /// The file could not be placed; the reason has been logged.
    Invalid,
}

/// Join a resolved relative path onto the destination root.
///
/// Resolved patterns usually start with `/`; leading root and prefix components are
/// dropped. Returns `None` when `relative` contains a `..` component, since the result
/// must stay below `root`.
pub fn target_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut target = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => return None,
            Component::Normal(part) => target.push(part),
        }
    }
    Some(target)
}

/// Place `source` at `relative` below `destination_root`.
///
/// The root itself must already exist. Missing intermediate directories are created. An
/// existing target is reported as [`PlacementResult::Duplicate`] without comparing
/// contents. Any failure is logged and reported as [`PlacementResult::Invalid`].
pub fn place(
    source: &Path,
    destination_root: &Path,
    relative: &str,
    transfer: Transfer,
) -> PlacementResult {
    if !destination_root.is_dir() {
        log::warn!(
            "Destination root {} does not exist; cannot place {}",
            destination_root.display(),
            source.display()
        );
        return PlacementResult::Invalid;
    }

    let Some(target) = target_path(destination_root, relative) else {
        log::warn!(
            "Resolved path '{relative}' for {} leaves the destination root",
            source.display()
        );
        return PlacementResult::Invalid;
    };

    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("Failed to create directory {}: {e}", parent.display());
            return PlacementResult::Invalid;
        }
    }

    if target.exists() {
        log::debug!("  {} already exists", target.display());
        return PlacementResult::Duplicate;
    }

    let outcome = match transfer {
        Transfer::Move => move_file(source, &target).map(|()| PlacementResult::Moved),
        Transfer::Copy => fs::copy(source, &target)
            .map(|_| PlacementResult::Copied)
            .with_context(|| format!("Failed to copy to {}", target.display())),
    };

    match outcome {
        Ok(result) => {
            log::debug!("  {result:?} to {}", target.display());
            result
        }
        Err(e) => {
            log::warn!("Failed to place {}: {e:#}", source.display());
            PlacementResult::Invalid
        }
    }
}

/// Rename, falling back to copy-then-remove when source and target are on different
/// file systems.
fn move_file(source: &Path, target: &Path) -> Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, target)
                .with_context(|| format!("Failed to copy to {}", target.display()))?;
            fs::remove_file(source)
                .with_context(|| format!("Copied but failed to remove {}", source.display()))
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to move to {}", target.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    // ── target_path ──────────────────────────────────────────────────

    #[test]
    fn target_strips_leading_slash() {
        let root = Path::new("/dest");
        assert_eq!(
            target_path(root, "/2022/03/IMG.JPG"),
            Some(PathBuf::from("/dest/2022/03/IMG.JPG"))
        );
        assert_eq!(target_path(root, "2022/IMG.JPG"), Some(PathBuf::from("/dest/2022/IMG.JPG")));
        assert_eq!(target_path(root, "./a/b.jpg"), Some(PathBuf::from("/dest/a/b.jpg")));
    }

    #[test]
    fn target_rejects_parent_components() {
        let root = Path::new("/dest");
        assert_eq!(target_path(root, "/2022/../../etc/IMG.JPG"), None);
        assert_eq!(target_path(root, "../IMG.JPG"), None);
        assert_eq!(target_path(root, "/2022/../IMG.JPG"), None);
        // dots inside a name are not a parent component
        assert_eq!(target_path(root, "/a..b/IMG.JPG"), Some(PathBuf::from("/dest/a..b/IMG.JPG")));
    }

    // ── place ────────────────────────────────────────────────────────

    #[test]
    fn copy_then_duplicate() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = source_file(&src, "IMG_0001.JPG", b"pixels");

        let first = place(&source, dest.path(), "/2022/03/IMG_0001.JPG", Transfer::Copy);
        let second = place(&source, dest.path(), "/2022/03/IMG_0001.JPG", Transfer::Copy);

        assert_eq!(first, PlacementResult::Copied);
        assert_eq!(second, PlacementResult::Duplicate);
        assert!(source.exists());
        assert_eq!(fs::read(dest.path().join("2022/03/IMG_0001.JPG")).unwrap(), b"pixels");
    }

    #[test]
    fn move_removes_source() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = source_file(&src, "IMG_0002.JPG", b"pixels");

        let result = place(&source, dest.path(), "/2022/IMG_0002.JPG", Transfer::Move);

        assert_eq!(result, PlacementResult::Moved);
        assert!(!source.exists());
        assert!(dest.path().join("2022/IMG_0002.JPG").exists());
    }

    #[test]
    fn result_matches_operation_performed() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let kept = source_file(&src, "a.jpg", b"a");
        let moved = source_file(&src, "b.jpg", b"b");

        // Copied means the source is still there, Moved means it is gone.
        assert_eq!(place(&kept, dest.path(), "a.jpg", Transfer::Copy), PlacementResult::Copied);
        assert!(kept.exists());
        assert_eq!(place(&moved, dest.path(), "b.jpg", Transfer::Move), PlacementResult::Moved);
        assert!(!moved.exists());
    }

    #[test]
    fn duplicate_is_existence_based() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("IMG.JPG"), b"something else").unwrap();
        let source = source_file(&src, "IMG.JPG", b"pixels");

        assert_eq!(place(&source, dest.path(), "/IMG.JPG", Transfer::Move), PlacementResult::Duplicate);
        assert!(source.exists());
        assert_eq!(fs::read(dest.path().join("IMG.JPG")).unwrap(), b"something else");
    }

    #[test]
    fn missing_root_is_invalid() {
        let src = TempDir::new().unwrap();
        let source = source_file(&src, "IMG.JPG", b"pixels");
        let missing = src.path().join("no-such-root");

        assert_eq!(place(&source, &missing, "/x/IMG.JPG", Transfer::Copy), PlacementResult::Invalid);
        assert!(!missing.exists());
    }

    #[test]
    fn directory_creation_failure_is_invalid() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let source = source_file(&src, "IMG.JPG", b"pixels");
        // a file where a directory is needed
        fs::write(dest.path().join("2022"), b"").unwrap();

        assert_eq!(
            place(&source, dest.path(), "/2022/03/IMG.JPG", Transfer::Copy),
            PlacementResult::Invalid
        );
    }

    #[test]
    fn escaping_path_is_invalid() {
        let outer = TempDir::new().unwrap();
        let dest = outer.path().join("library");
        fs::create_dir(&dest).unwrap();
        let src = TempDir::new().unwrap();
        let source = source_file(&src, "IMG.JPG", b"pixels");

        let result = place(&source, &dest, "/2022/../../escaped/IMG.JPG", Transfer::Move);

        assert_eq!(result, PlacementResult::Invalid);
        assert!(source.exists());
        assert!(!outer.path().join("escaped").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn missing_source_is_invalid() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let gone = src.path().join("gone.jpg");

        assert_eq!(place(&gone, dest.path(), "gone.jpg", Transfer::Copy), PlacementResult::Invalid);
        assert_eq!(place(&gone, dest.path(), "gone.jpg", Transfer::Move), PlacementResult::Invalid);
    }

    #[test]
    fn existing_directories_are_fine() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(dest.path().join("2022/03")).unwrap();
        let source = source_file(&src, "IMG.JPG", b"pixels");

        assert_eq!(place(&source, dest.path(), "/2022/03/IMG.JPG", Transfer::Copy), PlacementResult::Copied);
    }

    #[test]
    fn transfer_from_flag() {
        assert_eq!(Transfer::from_move_flag(true), Transfer::Move);
        assert_eq!(Transfer::from_move_flag(false), Transfer::Copy);
    }
}
