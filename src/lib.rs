/*!
The treeignore crate decides whether paths are ignored according to one or
more gitignore-style pattern files, and walks directory trees while pruning
ignored subtrees. It is meant to be embedded by tools that must skip
excluded paths without shelling out to version control: backup utilities,
search indexers, build tools.

An [`IgnoreList`] is built from explicit pattern files, ad hoc globs, or by
discovering every ignore file under the enclosing repository root. Each
appended file contributes its own source, scoped to the directory the file
lives in, so a pattern anchored with a leading `/` applies under that
directory and nowhere else. Once built, the list answers point queries via
[`IgnoreList::matched`] and drives a pruning traversal via
[`IgnoreList::walk`].

# Example

Build a list from a single ignore file and walk a tree. Matched files are
skipped and matched directories are never descended into:

```rust,no_run
use treeignore::{IgnoreList, WalkState};

let list = IgnoreList::from_path(".gitignore").unwrap();
list.walk(".", |path, _is_dir| {
    println!("{}", path.display());
    Ok(WalkState::Continue)
})
.unwrap();
```

# Example: repository discovery

[`IgnoreList::from_git`] locates the enclosing repository root and folds in
every ignore file beneath it. Whether a missing repository is fatal is the
caller's call:

```rust,no_run
use treeignore::{Error, IgnoreList};

let mut list = match IgnoreList::from_git() {
    Ok(list) => list,
    Err(Error::RepoNotFound) => IgnoreList::new().unwrap(),
    Err(err) => panic!("{}", err),
};
list.append_glob("*.bak").unwrap();
assert!(list.matched("notes.bak", false));
```

# Thread safety

All appending takes `&mut self` and all querying takes `&self`, so a list
cannot be mutated while a walk is reading it. A finished list is `Send` and
`Sync` and may be shared across threads behind a reference.
*/

#![deny(missing_docs)]

use std::error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub use crate::list::{IgnoreList, IGNORE_FILE_NAME};
pub use crate::repo::{find_repo_root, find_repo_root_named, REPO_MARKER};
pub use crate::walk::WalkState;

mod list;
mod pathutil;
mod repo;
mod walk;

/// Represents an error that can occur while building or using an ignore
/// list.
#[derive(Debug)]
pub enum Error {
    /// An error that occurred reading a pattern file or traversing a
    /// directory tree.
    Io(io::Error),
    /// An error that occurred trying to parse a glob.
    Glob {
        /// The original glob text, when available.
        glob: Option<String>,
        /// The underlying glob error as a string.
        err: String,
    },
    /// Upward discovery ran out of ancestors without finding a repository
    /// marker directory.
    RepoNotFound,
    /// An error associated with a specific file path.
    WithPath {
        /// The file path.
        path: PathBuf,
        /// The underlying error.
        err: Box<Error>,
    },
}

impl Error {
    /// Inspect the original [`io::Error`] if there is one.
    ///
    /// Returns `None` if this error does not correspond to an I/O error,
    /// e.g. a glob that failed to parse.
    pub fn io_error(&self) -> Option<&io::Error> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::WithPath { ref err, .. } => err.io_error(),
            _ => None,
        }
    }

    /// Turn this error into a tagged error with the given file path.
    fn with_path<P: AsRef<Path>>(self, path: P) -> Error {
        Error::WithPath {
            path: path.as_ref().to_path_buf(),
            err: Box::new(self),
        }
    }

    /// Build an error from a walkdir error, keeping the offending path
    /// when it is known.
    fn from_walkdir(err: walkdir::Error) -> Error {
        let path = err.path().map(|p| p.to_path_buf());
        let err = Error::Io(io::Error::from(err));
        match path {
            None => err,
            Some(path) => err.with_path(path),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::WithPath { ref err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Glob { glob: None, ref err } => write!(f, "{}", err),
            Error::Glob { glob: Some(ref glob), ref err } => {
                write!(f, "error parsing glob '{}': {}", glob, err)
            }
            Error::RepoNotFound => write!(f, "no repository root found"),
            Error::WithPath { ref path, ref err } => {
                write!(f, "{}: {}", path.display(), err)
            }
        }
    }
}
