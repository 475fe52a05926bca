//! Virtual-path normalization helpers shared across host abstractions.

/// Normalizes a virtual filesystem path to its absolute POSIX form.
///
/// Surrounding whitespace is trimmed, empty and `.` segments are dropped, and `..` pops the
/// preceding segment (at the root it is a no-op). The result always starts with `/` and never
/// ends with one unless it is the root itself.
pub fn normalize_virtual_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut out = String::new();
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            if let Some(idx) = out.rfind('/') {
                out.truncate(idx);
            }
            continue;
        }
        out.push('/');
        out.push_str(segment);
    }

    if out.is_empty() {
        "/".to_string()
    } else {
        out
    }
}

/// Resolves `path` against `cwd` and normalizes the result.
///
/// Absolute paths ignore `cwd`; relative paths are appended to it before normalization.
pub fn resolve_virtual_path(cwd: &str, path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        normalize_virtual_path(trimmed)
    } else {
        normalize_virtual_path(&format!("{cwd}/{trimmed}"))
    }
}

/// Splits a normalized absolute path into its parent path and basename.
///
/// Returns `None` for the root, which has no parent.
pub fn split_parent(normalized: &str) -> Option<(&str, &str)> {
    if normalized == "/" {
        return None;
    }
    let idx = normalized.rfind('/')?;
    let parent = if idx == 0 { "/" } else { &normalized[..idx] };
    Some((parent, &normalized[idx + 1..]))
}

/// Iterates over the segments of a normalized absolute path.
pub fn segments(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split('/').filter(|segment| !segment.is_empty())
}

/// Joins a normalized directory path and a child basename.
pub fn join_child(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns `true` when `candidate` equals `ancestor` or lies beneath it.
pub fn is_same_or_descendant(ancestor: &str, candidate: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    candidate == ancestor
        || candidate
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn normalize_virtual_path_matches_expected_cases() {
        let cases = [
            ("", "/"),
            ("   ", "/"),
            ("foo/bar", "/foo/bar"),
            ("/foo//bar/", "/foo/bar"),
            ("./foo/../bar", "/bar"),
            ("/../../", "/"),
            ("/a/b/../../c/./d", "/c/d"),
            ("/a\\b", "/a\\b"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_virtual_path(input), expected, "input={input:?}");
        }
    }

    #[test]
    fn resolve_virtual_path_uses_cwd_for_relative_paths() {
        assert_eq!(resolve_virtual_path("/home/user", "notes.txt"), "/home/user/notes.txt");
        assert_eq!(resolve_virtual_path("/home/user", "../guest"), "/home/guest");
        assert_eq!(resolve_virtual_path("/home/user", "/tmp/x"), "/tmp/x");
        assert_eq!(resolve_virtual_path("/", "."), "/");
    }

    #[test]
    fn split_parent_handles_root_children_and_nested_paths() {
        assert_eq!(split_parent("/"), None);
        assert_eq!(split_parent("/home"), Some(("/", "home")));
        assert_eq!(split_parent("/home/docs/a.txt"), Some(("/home/docs", "a.txt")));
    }

    #[test]
    fn descendant_check_respects_segment_boundaries() {
        assert!(is_same_or_descendant("/a", "/a"));
        assert!(is_same_or_descendant("/a", "/a/b"));
        assert!(!is_same_or_descendant("/a", "/ab"));
        assert!(is_same_or_descendant("/", "/anything"));
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        let segment = prop_oneof![
            Just(".".to_string()),
            Just("..".to_string()),
            Just(String::new()),
            "[a-z0-9_]{1,6}",
        ];
        (any::<bool>(), prop::collection::vec(segment, 0..10)).prop_map(|(absolute, parts)| {
            let joined = parts.join("/");
            if absolute {
                format!("/{joined}")
            } else {
                joined
            }
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in path_strategy()) {
            let once = normalize_virtual_path(&path);
            prop_assert_eq!(normalize_virtual_path(&once), once.clone());
            prop_assert!(once.starts_with('/'));
            prop_assert!(!once.contains("//"));
            prop_assert!(once == "/" || !once.ends_with('/'));
        }
    }
}
