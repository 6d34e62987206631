/*!
The list module provides [`IgnoreList`], an ordered collection of ignore
sources anchored at a base directory, together with the matching logic that
decides whether a candidate path is ignored.
*/

use std::env;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::pathutil;
use crate::repo;
use crate::Error;

/// The file name scanned for by [`IgnoreList::append_all`] and
/// [`IgnoreList::from_git`].
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// The patterns contributed by a single pattern file (or one ad hoc glob),
/// together with the directory they were declared in.
#[derive(Clone, Debug)]
struct Source {
    /// Compiled matchers in declaration order. Order never affects the
    /// verdict since there is no negation; any match wins.
    patterns: Vec<GlobMatcher>,
    /// The declaring directory, relative to the list's base, with `/`
    /// separators. Empty means the base itself.
    root: String,
}

/// An ordered collection of ignore sources, anchored at a base directory.
///
/// The base is fixed when the list is constructed (the current working
/// directory for [`IgnoreList::new`]) and every queried path is interpreted
/// relative to it. Relocating the effective root means constructing a new
/// list.
///
/// Patterns follow the gitignore subset: blank lines and `#` comments are
/// skipped, trailing unescaped spaces are stripped, a leading `/` anchors a
/// pattern to its file's directory, and a trailing `/` restricts it to
/// directories. Negation (`!`) is not supported.
#[derive(Clone, Debug)]
pub struct IgnoreList {
    sources: Vec<Source>,
    /// Segments of the absolute base directory.
    base: Vec<String>,
}

impl IgnoreList {
    /// Creates a new, empty ignore list based at the current working
    /// directory.
    pub fn new() -> Result<IgnoreList, Error> {
        let cwd = env::current_dir().map_err(Error::Io)?;
        Ok(IgnoreList {
            sources: vec![],
            base: pathutil::absolute_segments(&cwd, &[]),
        })
    }

    /// Creates a new, empty ignore list based at the given directory.
    /// A relative `dir` is resolved against the current working directory.
    pub fn with_base<P: AsRef<Path>>(dir: P) -> Result<IgnoreList, Error> {
        let dir = dir.as_ref();
        if dir.is_absolute() {
            return Ok(IgnoreList {
                sources: vec![],
                base: pathutil::absolute_segments(dir, &[]),
            });
        }
        let mut list = IgnoreList::new()?;
        list.base = pathutil::absolute_segments(dir, &list.base);
        Ok(list)
    }

    /// Creates a new ignore list populated with the contents of the
    /// pattern file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<IgnoreList, Error> {
        let mut list = IgnoreList::new()?;
        list.append(path)?;
        Ok(list)
    }

    /// Creates a new ignore list populated from every [`IGNORE_FILE_NAME`]
    /// file under the enclosing repository root.
    ///
    /// Returns [`Error::RepoNotFound`] when no ancestor of the current
    /// working directory contains a [`REPO_MARKER`] directory; the caller
    /// decides whether that means falling back to an empty list.
    ///
    /// [`REPO_MARKER`]: crate::REPO_MARKER
    pub fn from_git() -> Result<IgnoreList, Error> {
        let mut list = IgnoreList::new()?;
        let root =
            repo::root_from_segments(list.base.clone(), repo::REPO_MARKER)?;
        list.append_all(&root)?;
        Ok(list)
    }

    /// Returns true when this list holds no patterns at all.
    pub fn is_empty(&self) -> bool {
        self.sources.iter().all(|source| source.patterns.is_empty())
    }

    /// Returns the total number of compiled patterns across all sources.
    pub fn len(&self) -> usize {
        self.sources.iter().map(|source| source.patterns.len()).sum()
    }

    /// Compiles a single ad hoc glob and adds it as its own source, rooted
    /// at the base directory.
    ///
    /// Fails with [`Error::Glob`] when the glob does not parse; the list is
    /// left unchanged in that case.
    pub fn append_glob(&mut self, glob: &str) -> Result<(), Error> {
        let matcher = compile(glob)?;
        self.sources
            .push(Source { patterns: vec![matcher], root: String::new() });
        Ok(())
    }

    /// Appends the patterns in the file at `path` as a new source rooted at
    /// the file's directory.
    ///
    /// An unreadable file is an error. A single line that fails to compile
    /// is not: it is logged and skipped, and the rest of the file still
    /// contributes.
    pub fn append<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => return Err(Error::Io(err).with_path(path)),
        };
        let root = self.rel_to_base(path.parent().unwrap_or(Path::new("")));
        let mut patterns = vec![];
        for (i, line) in io::BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => return Err(Error::Io(err).with_path(path)),
            };
            match compile_line(&root, &line) {
                None => {}
                Some(Ok(matcher)) => patterns.push(matcher),
                Some(Err(err)) => {
                    log::warn!(
                        "{}: line {}: skipping invalid glob: {}",
                        path.display(),
                        i + 1,
                        err
                    );
                }
            }
        }
        self.sources.push(Source { patterns, root });
        Ok(())
    }

    /// Walks the tree rooted at `root` and appends every file named
    /// [`IGNORE_FILE_NAME`], each scoped to its own directory.
    pub fn append_all<P: AsRef<Path>>(&mut self, root: P) -> Result<(), Error> {
        self.append_all_named(root, IGNORE_FILE_NAME)
    }

    /// Like [`append_all`], with a caller-chosen marker file name.
    ///
    /// A missing starting root is an error. Entries that vanish while the
    /// walk is in progress are skipped; any other traversal error is fatal.
    ///
    /// [`append_all`]: IgnoreList::append_all
    pub fn append_all_named<P: AsRef<Path>>(
        &mut self,
        root: P,
        file_name: &str,
    ) -> Result<(), Error> {
        for result in WalkDir::new(root.as_ref()) {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() > 0 && is_not_found(&err) {
                        continue;
                    }
                    return Err(Error::from_walkdir(err));
                }
            };
            if entry.file_type().is_file()
                && entry.file_name() == OsStr::new(file_name)
            {
                self.append(entry.path())?;
            }
        }
        Ok(())
    }

    /// Returns whether any pattern in any source matches the given path.
    ///
    /// The path is interpreted relative to the base directory. If `is_dir`
    /// is true the path is taken to name a directory, which is what lets
    /// trailing-`/` patterns match it.
    pub fn matched<P: AsRef<Path>>(&self, path: P, is_dir: bool) -> bool {
        let path = pathutil::to_slash(path.as_ref());
        let whole = &*path;
        if whole.is_empty() {
            return false;
        }
        // Every pattern is tried against a small set of spellings of the
        // candidate: the full base-relative path, its basename (which is
        // how unanchored patterns float to any depth), a `./` form for
        // top-level entries (paired with base-anchored patterns), and
        // slash-terminated copies of each when the candidate is a
        // directory (paired with directory-only patterns).
        let name = pathutil::file_name(whole);
        let mut candidates = Vec::with_capacity(4);
        candidates.push(whole.to_string());
        if name == whole {
            candidates.push(format!("./{}", whole));
        } else {
            candidates.push(name.to_string());
        }
        if is_dir {
            for i in 0..candidates.len() {
                let dir_form = format!("{}/", candidates[i]);
                candidates.push(dir_form);
            }
        }
        for source in &self.sources {
            for pattern in &source.patterns {
                for candidate in &candidates {
                    if pattern.is_match(candidate) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// `dir` re-expressed relative to the base; empty when they coincide.
    pub(crate) fn rel_to_base(&self, dir: &Path) -> String {
        let segments = pathutil::absolute_segments(dir, &self.base);
        if segments == self.base {
            String::new()
        } else {
            pathutil::relative_root(&segments, &self.base)
        }
    }
}

/// Compiles a single pattern. `*`, `?`, and character classes never match a
/// path separator; `**` matches any number of segments.
fn compile(pattern: &str) -> Result<GlobMatcher, Error> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| Error::Glob {
            glob: Some(pattern.to_string()),
            err: err.kind().to_string(),
        })
}

/// Turns one pattern-file line into a compiled matcher. Comment and blank
/// lines produce nothing.
///
/// A leading `/` anchors the pattern to the source root instead of letting
/// its basename float to any depth. Anchored at the base, a pattern with an
/// interior slash is already pinned to the full base-relative path, while a
/// single-segment one takes a `./` prefix so it only pairs with top-level
/// candidates.
fn compile_line(root: &str, line: &str) -> Option<Result<GlobMatcher, Error>> {
    let line = normalize_line(line)?;
    let pattern = if line.starts_with('/') {
        let rest = &line[1..];
        let body = rest.strip_suffix('/').unwrap_or(rest);
        if !root.is_empty() {
            format!("{}/{}", root, rest)
        } else if body.contains('/') {
            rest.to_string()
        } else {
            format!("./{}", rest)
        }
    } else {
        line.to_string()
    };
    Some(compile(&pattern))
}

/// Cleans one raw line: comments and blanks yield nothing, trailing spaces
/// are stripped unless escaped. A line that strips down to nothing yields
/// nothing.
fn normalize_line(line: &str) -> Option<&str> {
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = strip_trailing_spaces(line);
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Strips unescaped trailing spaces. The scan runs from the end of the line
/// and stops at the first non-space, or at a space immediately preceded by
/// a backslash, which stays along with everything before it.
fn strip_trailing_spaces(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b' ' {
        if end >= 2 && bytes[end - 2] == b'\\' {
            break;
        }
        end -= 1;
    }
    &line[..end]
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error().map_or(false, |err| err.kind() == io::ErrorKind::NotFound)
}

#[cfg(test)]
impl IgnoreList {
    /// Appends the lines of `contents` as a source with the given root,
    /// without touching the filesystem. Mirrors `append`.
    pub(crate) fn append_str(&mut self, root: &str, contents: &str) {
        let mut patterns = vec![];
        for line in contents.lines() {
            match compile_line(root, line) {
                None => {}
                Some(Ok(matcher)) => patterns.push(matcher),
                Some(Err(err)) => panic!("bad test glob: {}", err),
            }
        }
        self.sources.push(Source { patterns, root: root.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{normalize_line, strip_trailing_spaces, IgnoreList};
    use crate::tests::{mkdirp, wfile, TempDir};
    use crate::Error;

    const BASE: &str = "/home/foobar/src/project";

    fn list_from_str(root: &str, contents: &str) -> IgnoreList {
        let mut list = IgnoreList::with_base(BASE).unwrap();
        list.append_str(root, contents);
        list
    }

    macro_rules! ignored {
        ($name:ident, $root:expr, $list:expr, $path:expr) => {
            ignored!($name, $root, $list, $path, false);
        };
        ($name:ident, $root:expr, $list:expr, $path:expr, $is_dir:expr) => {
            #[test]
            fn $name() {
                let list = list_from_str($root, $list);
                assert!(list.matched($path, $is_dir));
            }
        };
    }

    macro_rules! not_ignored {
        ($name:ident, $root:expr, $list:expr, $path:expr) => {
            not_ignored!($name, $root, $list, $path, false);
        };
        ($name:ident, $root:expr, $list:expr, $path:expr, $is_dir:expr) => {
            #[test]
            fn $name() {
                let list = list_from_str($root, $list);
                assert!(!list.matched($path, $is_dir));
            }
        };
    }

    ignored!(ig1, "", "months", "months");
    ignored!(ig2, "", "*.lock", "Cargo.lock");
    ignored!(ig3, "", "*.o", "src/helper.o");
    ignored!(ig4, "", "src/*.rs", "src/main.rs");
    ignored!(ig5, "", "**/foo", "src/x/foo");
    ignored!(ig6, "", "a/**/b", "a/x/y/b");
    ignored!(ig7, "", "build/", "build", true);
    ignored!(ig8, "", "build/", "x/build", true);
    ignored!(ig9, "", "/secrets.txt", "secrets.txt");
    ignored!(ig10, "sub", "/cache", "sub/cache");
    ignored!(ig11, "", "node_modules  ", "node_modules");
    ignored!(ig12, "", "[ab].rs", "a.rs");
    ignored!(ig13, "", "?.c", "x.c");
    ignored!(ig14, "", "# comment\nmonths", "months");
    ignored!(ig15, "", "foo\\ ", "foo ");
    ignored!(ig16, "", "/deep/dir", "deep/dir");
    ignored!(ig17, "", "/build/", "build", true);
    ignored!(ig18, "sub", "/cache/", "sub/cache", true);
    ignored!(ig19, "../up", "/cache", "../up/cache");

    not_ignored!(ignot1, "", "months", "amonths");
    not_ignored!(ignot2, "", "months", "monthsa");
    not_ignored!(ignot3, "", "build/", "build");
    not_ignored!(ignot4, "", "/secrets.txt", "nested/secrets.txt");
    not_ignored!(ignot5, "sub", "/cache", "cache");
    not_ignored!(ignot6, "sub", "/cache", "other/sub/cache");
    not_ignored!(ignot7, "", "# months", "months");
    not_ignored!(ignot8, "", "src/*.rs", "src/grep/main.rs");
    not_ignored!(ignot9, "", "*.o", "main.c");
    not_ignored!(ignot10, "", "/deep/dir", "x/deep/dir");
    not_ignored!(ignot11, "", "/build/", "x/build", true);
    not_ignored!(ignot12, "", "/build/", "build", false);
    not_ignored!(ignot13, "", "\n\n\n", "anything");

    #[test]
    fn trailing_space_handling() {
        assert_eq!(strip_trailing_spaces("foo"), "foo");
        assert_eq!(strip_trailing_spaces("foo  "), "foo");
        assert_eq!(strip_trailing_spaces("foo\\ "), "foo\\ ");
        assert_eq!(strip_trailing_spaces("foo\\  "), "foo\\ ");
        assert_eq!(strip_trailing_spaces("\\ "), "\\ ");
        assert_eq!(strip_trailing_spaces("   "), "");
    }

    #[test]
    fn normalize_drops_comments_and_blanks() {
        assert_eq!(normalize_line(""), None);
        assert_eq!(normalize_line("# build junk"), None);
        assert_eq!(normalize_line("   "), None);
        assert_eq!(normalize_line("target  "), Some("target"));
        assert_eq!(normalize_line("target"), Some("target"));
    }

    #[test]
    fn append_glob_rejects_bad_syntax() {
        let mut list = IgnoreList::with_base(BASE).unwrap();
        list.append_glob("*.o").unwrap();
        let err = list.append_glob("logs[").unwrap_err();
        match err {
            Error::Glob { glob, .. } => {
                assert_eq!(glob.as_deref(), Some("logs["));
            }
            err => panic!("unexpected error: {}", err),
        }
        // the failed append leaves the matched set unchanged
        assert_eq!(list.len(), 1);
        assert!(list.matched("main.o", false));
        assert!(!list.matched("main.c", false));
    }

    #[test]
    fn duplicate_appends_do_not_change_the_verdict() {
        let mut once = IgnoreList::with_base(BASE).unwrap();
        once.append_glob("*.o").unwrap();
        let mut twice = IgnoreList::with_base(BASE).unwrap();
        twice.append_glob("*.o").unwrap();
        twice.append_glob("*.o").unwrap();
        for path in &["main.o", "main.c", "src/helper.o", "src"] {
            assert_eq!(once.matched(path, false), twice.matched(path, false));
            assert_eq!(once.matched(path, true), twice.matched(path, true));
        }
    }

    #[test]
    fn empty_list_matches_nothing() {
        let list = IgnoreList::with_base(BASE).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(!list.matched("anything", false));
        assert!(!list.matched("any/where", true));
    }

    #[test]
    fn append_keeps_going_past_a_bad_line() {
        let td = TempDir::new().unwrap();
        let path = td.path().join("ignorefile");
        wfile(&path, "good\nbad[\nalso-good\n");
        let mut list = IgnoreList::with_base(td.path()).unwrap();
        list.append(&path).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.matched("good", false));
        assert!(list.matched("also-good", false));
    }

    #[test]
    fn append_missing_file_is_an_io_error() {
        let td = TempDir::new().unwrap();
        let mut list = IgnoreList::with_base(td.path()).unwrap();
        let err = list.append(td.path().join("no-such-file")).unwrap_err();
        assert_eq!(
            err.io_error().map(|e| e.kind()),
            Some(io::ErrorKind::NotFound)
        );
        assert!(list.is_empty());
    }

    #[test]
    fn from_path_matches_its_own_literal_lines() {
        let td = TempDir::new().unwrap();
        let path = td.path().join("ignorefile");
        wfile(&path, "Makefile\nTAGS\nnotes.txt\n");
        let list = IgnoreList::from_path(&path).unwrap();
        for name in &["Makefile", "TAGS", "notes.txt"] {
            assert!(list.matched(name, false));
            assert!(list.matched(format!("deep/nested/{}", name), false));
        }
        assert!(!list.matched("README", false));
    }

    #[test]
    fn nested_file_roots_anchor_leading_slash_patterns() {
        let td = TempDir::new().unwrap();
        mkdirp(td.path().join("sub"));
        wfile(td.path().join("sub/ignorefile"), "/cache\n*.tmp\n");
        let mut list = IgnoreList::with_base(td.path()).unwrap();
        list.append(td.path().join("sub/ignorefile")).unwrap();
        assert!(list.matched("sub/cache", false));
        assert!(!list.matched("cache", false));
        // unanchored patterns float free of the file's directory
        assert!(list.matched("anywhere/x.tmp", false));
    }

    #[test]
    fn append_all_collects_every_marker_file() {
        let td = TempDir::new().unwrap();
        mkdirp(td.path().join("a/b"));
        wfile(td.path().join("ignorefile"), "*.log\n");
        wfile(td.path().join("a/b/ignorefile"), "/cache\n");
        let mut list = IgnoreList::with_base(td.path()).unwrap();
        list.append_all_named(td.path(), "ignorefile").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.matched("x.log", false));
        assert!(list.matched("a/b/cache", false));
        assert!(!list.matched("a/cache", false));
    }

    #[test]
    fn append_all_missing_root_is_an_error() {
        let td = TempDir::new().unwrap();
        let mut list = IgnoreList::with_base(td.path()).unwrap();
        let err = list.append_all(td.path().join("not-here")).unwrap_err();
        assert!(err.io_error().is_some());
    }
}
