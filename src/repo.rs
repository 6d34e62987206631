/*!
Upward discovery of a repository root by its marker directory.
*/

use std::env;
use std::path::{Path, PathBuf};

use crate::pathutil;
use crate::Error;

/// The marker directory whose presence identifies a repository root.
pub const REPO_MARKER: &str = ".git";

/// Finds the nearest ancestor of `start` (inclusive) that contains a
/// [`REPO_MARKER`] directory.
pub fn find_repo_root<P: AsRef<Path>>(start: P) -> Result<PathBuf, Error> {
    find_repo_root_named(start, REPO_MARKER)
}

/// Like [`find_repo_root`], with a caller-chosen marker name.
///
/// A relative `start` is resolved against the current working directory.
/// Fails with [`Error::RepoNotFound`] once the filesystem root has been
/// checked without finding the marker.
pub fn find_repo_root_named<P: AsRef<Path>>(
    start: P,
    marker: &str,
) -> Result<PathBuf, Error> {
    let start = start.as_ref();
    let segments = if start.is_absolute() {
        pathutil::absolute_segments(start, &[])
    } else {
        let cwd = env::current_dir().map_err(Error::Io)?;
        let cwd = pathutil::absolute_segments(&cwd, &[]);
        pathutil::absolute_segments(start, &cwd)
    };
    root_from_segments(segments, marker)
}

/// The bounded upward search itself: one segment dropped per miss, with a
/// single remaining segment as the terminal failure case.
pub(crate) fn root_from_segments(
    mut segments: Vec<String>,
    marker: &str,
) -> Result<PathBuf, Error> {
    loop {
        let dir = pathutil::segments_to_path(&segments);
        if dir.join(marker).is_dir() {
            return Ok(dir);
        }
        if segments.len() <= 1 {
            return Err(Error::RepoNotFound);
        }
        segments.pop();
    }
}
