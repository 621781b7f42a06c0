//! Normalization of user-supplied directory arguments.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Expands `~`, makes the path absolute and removes `.`/`..` components.
/// An empty argument means the current directory.
pub fn format_directory(input: &str) -> io::Result<PathBuf> {
    let input = if input.is_empty() { "." } else { input };
    let expanded = expand_home(input);
    let absolute = std::path::absolute(&expanded)?;
    Ok(clean(&absolute))
}

/// Replaces a leading `~` with the home directory. Left untouched on
/// Windows or when no home directory is known.
pub fn expand_home(input: &str) -> PathBuf {
    if cfg!(windows) {
        return PathBuf::from(input);
    }

    let rest = if input == "~" {
        Some("")
    } else {
        input.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(input),
    }
}

/// Lexically simplifies a path, like Go's `filepath.Clean`: `.` is dropped,
/// `..` removes the preceding normal component, and `..` at the root is
/// discarded. An empty result becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_dots() {
        assert_eq!(clean(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
        assert_eq!(clean(Path::new("a//b")), PathBuf::from("a/b"));
        assert_eq!(clean(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_clean_keeps_leading_parent_dirs() {
        assert_eq!(clean(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(clean(Path::new("a/../../x")), PathBuf::from("../x"));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_stops_at_root() {
        assert_eq!(clean(Path::new("/../..")), PathBuf::from("/"));
        assert_eq!(clean(Path::new("/../tmp")), PathBuf::from("/tmp"));
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/Videos"), home.join("Videos"));
        assert_eq!(expand_home("~other/Videos"), PathBuf::from("~other/Videos"));
        assert_eq!(expand_home("/srv/media"), PathBuf::from("/srv/media"));
    }

    #[test]
    fn test_format_directory_is_absolute() {
        let formatted = format_directory("some/./relative/../dir").unwrap();
        assert!(formatted.is_absolute());
        assert!(formatted.ends_with("some/dir"));
    }

    #[test]
    fn test_format_directory_empty_is_current_dir() {
        let formatted = format_directory("").unwrap();
        let current = clean(&std::env::current_dir().unwrap());
        assert_eq!(formatted, current);
        assert_eq!(format_directory(".").unwrap(), formatted);
    }
}
