use std::borrow::Cow;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Returns the final `/`-separated segment of `path`. For a path with a
/// single segment, that is the path itself.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        None => path,
        Some(i) => &path[i + 1..],
    }
}

/// Returns `path` as forward-slash text, suitable for glob matching.
pub fn to_slash(path: &Path) -> Cow<'_, str> {
    let s = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' || !s.contains(MAIN_SEPARATOR) {
        s
    } else {
        Cow::Owned(s.replace(MAIN_SEPARATOR, "/"))
    }
}

/// Splits `path` into normalized segments, resolving it against the `base`
/// segments when it is relative. `.` components disappear and `..`
/// components pop, never past the filesystem root.
///
/// An absolute Unix path yields a leading empty segment, matching what
/// splitting the path text on the separator would produce.
pub fn absolute_segments(path: &Path, base: &[String]) -> Vec<String> {
    let mut segments: Vec<String> =
        if path.is_absolute() { vec![] } else { base.to_vec() };
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                segments.clear();
                segments
                    .push(prefix.as_os_str().to_string_lossy().into_owned());
            }
            Component::RootDir => {
                if segments.is_empty() {
                    segments.push(String::new());
                } else {
                    // after a drive prefix there is nothing to add
                    segments.truncate(1);
                }
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            Component::Normal(name) => {
                segments.push(name.to_string_lossy().into_owned());
            }
        }
    }
    segments
}

/// Expresses `declared` relative to `base`: the longest common segment
/// prefix is dropped, each remaining base segment becomes a `..`, and the
/// remaining declared segments follow, joined with `/`.
pub fn relative_root(declared: &[String], base: &[String]) -> String {
    let common = declared
        .iter()
        .zip(base.iter())
        .take_while(|(d, b)| d == b)
        .count();
    let mut parts: Vec<&str> =
        Vec::with_capacity((base.len() - common) + (declared.len() - common));
    for _ in common..base.len() {
        parts.push("..");
    }
    for segment in &declared[common..] {
        parts.push(segment);
    }
    parts.join("/")
}

/// Reassembles segments into an OS path. The lone empty segment produced
/// by splitting a Unix root reassembles to the separator itself.
pub fn segments_to_path(segments: &[String]) -> PathBuf {
    let sep = MAIN_SEPARATOR.to_string();
    let joined = segments.join(&sep);
    if joined.is_empty() {
        PathBuf::from(sep)
    } else {
        PathBuf::from(joined)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{absolute_segments, file_name, relative_root};

    fn segs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_name_takes_the_final_segment() {
        assert_eq!(file_name("a/b/c"), "c");
        assert_eq!(file_name("c"), "c");
        assert_eq!(file_name("a/"), "");
    }

    #[test]
    fn absolute_paths_ignore_the_base() {
        assert_eq!(
            absolute_segments(Path::new("/a/b"), &segs(&["", "x"])),
            segs(&["", "a", "b"])
        );
    }

    #[test]
    fn relative_paths_resolve_against_the_base() {
        let base = segs(&["", "home", "user"]);
        assert_eq!(
            absolute_segments(Path::new("src"), &base),
            segs(&["", "home", "user", "src"])
        );
        assert_eq!(absolute_segments(Path::new("./src/.."), &base), base);
        assert_eq!(
            absolute_segments(Path::new("../other"), &base),
            segs(&["", "home", "other"])
        );
    }

    #[test]
    fn parent_components_stop_at_the_root() {
        assert_eq!(
            absolute_segments(Path::new("../.."), &segs(&["", "tmp"])),
            segs(&[""])
        );
        assert_eq!(absolute_segments(Path::new(".."), &segs(&[""])), segs(&[""]));
    }

    #[test]
    fn relative_root_backtracks_past_the_common_prefix() {
        let base = segs(&["", "a", "b"]);
        assert_eq!(relative_root(&segs(&["", "a", "b", "c"]), &base), "c");
        assert_eq!(relative_root(&segs(&["", "a", "x"]), &base), "../x");
        assert_eq!(relative_root(&segs(&["", "a"]), &base), "..");
        assert_eq!(relative_root(&segs(&["", "z"]), &base), "../../z");
        assert_eq!(
            relative_root(&segs(&["", "a", "b", "c", "d"]), &base),
            "c/d"
        );
    }

    #[cfg(unix)]
    #[test]
    fn the_root_reassembles_to_a_separator() {
        use super::segments_to_path;

        assert_eq!(segments_to_path(&segs(&[""])), Path::new("/"));
        assert_eq!(segments_to_path(&segs(&["", "tmp"])), Path::new("/tmp"));
    }
}
