//! Name sanitization and path resolution
//!
//! Every name that reaches the store is untrusted. These helpers reduce it to
//! a single path component and prove the resulting path stays inside the
//! store root.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Prefix of in-flight upload files inside the store root.
pub const TEMP_PREFIX: &str = ".partial-";

/// Characters a user may not put in a rename target.
pub const FORBIDDEN_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '|', '*', '?', '\\', '/'];

/// Strips every directory component, accepting both `/` and `\` separators.
///
/// `"../../etc/passwd"` becomes `"passwd"`, `"C:\\tmp\\a.txt"` becomes
/// `"a.txt"`. Trailing separators are ignored (`"dir/"` becomes `"dir"`).
pub fn base_name(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
}

/// Splits a name at its last dot into stem and extension.
///
/// A leading dot counts, so `".sh"` has stem `""` and extension `"sh"`.
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
        None => (name, None),
    }
}

/// Lowercased extension of a name, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    split_name(name).1.map(|ext| ext.to_ascii_lowercase())
}

/// True for `.` and `..`, the only single components that leave a directory.
pub fn is_dot_name(name: &str) -> bool {
    name == "." || name == ".."
}

/// Sanitizes an uploaded or requested name down to a usable base name.
pub fn sanitize_name(raw: &str) -> Result<&str, StoreError> {
    let name = base_name(raw);

    if name.is_empty() {
        return Err(StoreError::InvalidName("name is empty".into()));
    }
    if is_dot_name(name) {
        return Err(StoreError::PathEscape);
    }
    check_reserved(name)?;
    Ok(name)
}

/// Validates a rename target exactly as given; nothing is stripped.
pub fn validate_new_name(raw: &str) -> Result<&str, StoreError> {
    if raw.trim().is_empty() {
        return Err(StoreError::InvalidName("name is empty".into()));
    }
    if let Some(c) = raw.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(StoreError::InvalidName(format!(
            "character {c:?} is not allowed"
        )));
    }
    if is_dot_name(raw) {
        return Err(StoreError::InvalidName(format!("{raw:?} is reserved")));
    }
    check_reserved(raw)?;
    Ok(raw)
}

fn check_reserved(name: &str) -> Result<(), StoreError> {
    if name.chars().any(char::is_control) {
        return Err(StoreError::InvalidName(
            "control characters are not allowed".into(),
        ));
    }
    if name.starts_with(TEMP_PREFIX) {
        return Err(StoreError::InvalidName(format!(
            "names starting with {TEMP_PREFIX:?} are reserved"
        )));
    }
    Ok(())
}

/// Canonical form of the store root, used as the containment reference.
pub fn canonical_root(root: &Path) -> Result<PathBuf, StoreError> {
    root.canonicalize()
        .map_err(|_| StoreError::NotFound("upload directory".into()))
}

/// Resolves a sanitized single-component name under the canonical root.
///
/// When the entry exists (including a dangling symlink) its canonical form
/// must be a strict descendant of the root. A name that does not exist yet
/// cannot leave the root since it holds no separators and is not `.`/`..`.
pub fn resolve_in_root(canonical_root: &Path, name: &str) -> Result<PathBuf, StoreError> {
    if name.is_empty() || is_dot_name(name) || name.contains(['/', '\\']) {
        return Err(StoreError::PathEscape);
    }

    let candidate = canonical_root.join(name);

    if candidate.symlink_metadata().is_ok() {
        let resolved = candidate
            .canonicalize()
            .map_err(|_| StoreError::PathEscape)?;
        if resolved == canonical_root || !resolved.starts_with(canonical_root) {
            return Err(StoreError::PathEscape);
        }
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("report.pdf"), "report.pdf");
        assert_eq!(base_name("../../etc/passwd"), "passwd");
        assert_eq!(base_name("/etc/shadow"), "shadow");
        assert_eq!(base_name("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(base_name("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(base_name("dir/"), "dir");
        assert_eq!(base_name("../"), "..");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a.txt"), ("a", Some("txt")));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_name("README"), ("README", None));
        assert_eq!(split_name(".sh"), ("", Some("sh")));
        assert_eq!(split_name("trailing."), ("trailing", Some("")));
    }

    #[test]
    fn test_extension_of_lowercases() {
        assert_eq!(extension_of("SHELL.PHP"), Some("php".to_string()));
        assert_eq!(extension_of("x.php.txt"), Some("txt".to_string()));
        assert_eq!(extension_of("Makefile"), None);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("../../a.txt"), Ok("a.txt"));
        assert_eq!(sanitize_name("/abs/b.txt"), Ok("b.txt"));
        assert_eq!(sanitize_name(".."), Err(StoreError::PathEscape));
        assert_eq!(sanitize_name("x/.."), Err(StoreError::PathEscape));
        assert_eq!(sanitize_name("../."), Err(StoreError::PathEscape));
        assert!(matches!(sanitize_name(""), Err(StoreError::InvalidName(_))));
        assert!(matches!(sanitize_name("/"), Err(StoreError::InvalidName(_))));
        assert!(matches!(
            sanitize_name("bad\u{0}name"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            sanitize_name(".partial-abc"),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_new_name() {
        assert_eq!(validate_new_name("b.txt"), Ok("b.txt"));
        assert_eq!(validate_new_name("with space.txt"), Ok("with space.txt"));
        for bad in [
            "", "   ", ".", "..", "../b.txt", "a/b", "a\\b", "a:b", "a*b", "a?b", "a|b", "a<b",
            "a>b", "a\"b",
        ] {
            assert!(
                matches!(validate_new_name(bad), Err(StoreError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_in_root_accepts_plain_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = canonical_root(dir.path()).unwrap();

        let fresh = resolve_in_root(&root, "new.txt").unwrap();
        assert_eq!(fresh, root.join("new.txt"));

        fs::write(root.join("old.txt"), b"x").unwrap();
        assert_eq!(resolve_in_root(&root, "old.txt").unwrap(), root.join("old.txt"));
    }

    #[test]
    fn test_resolve_in_root_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = canonical_root(dir.path()).unwrap();

        assert_eq!(resolve_in_root(&root, ".."), Err(StoreError::PathEscape));
        assert_eq!(resolve_in_root(&root, "."), Err(StoreError::PathEscape));
        assert_eq!(resolve_in_root(&root, "../x"), Err(StoreError::PathEscape));
        assert_eq!(resolve_in_root(&root, ""), Err(StoreError::PathEscape));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_in_root_rejects_escaping_symlink() {
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, b"secret").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let root = canonical_root(dir.path()).unwrap();
        std::os::unix::fs::symlink(&secret, root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("linkdir")).unwrap();

        assert_eq!(resolve_in_root(&root, "link.txt"), Err(StoreError::PathEscape));
        assert_eq!(resolve_in_root(&root, "linkdir"), Err(StoreError::PathEscape));
    }

    #[test]
    fn test_canonical_root_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(canonical_root(&missing), Err(StoreError::NotFound(_))));
    }
}
