/*!
Pruning depth-first traversal driven by an [`IgnoreList`].
*/

use std::path::Path;

use walkdir::WalkDir;

use crate::list::IgnoreList;
use crate::pathutil;
use crate::Error;

/// Tells the walker how to proceed after an entry has been visited.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WalkState {
    /// Continue the traversal as normal.
    Continue,
    /// If the entry just visited was a directory, do not descend into it.
    /// Has no effect otherwise.
    Skip,
    /// End the traversal without an error.
    Quit,
}

impl IgnoreList {
    /// Walks the tree rooted at `root` depth-first, calling `visitor` with
    /// each entry's path and whether it is a directory.
    ///
    /// Entries matching this list never reach the visitor, and matched
    /// directories are pruned whole: nothing beneath them is read, even
    /// descendants that would not match on their own. The root itself is
    /// the traversal anchor and is not reported.
    ///
    /// An error returned by the visitor aborts the walk immediately and is
    /// propagated as is.
    pub fn walk<P, F>(&self, root: P, visitor: F) -> Result<(), Error>
    where
        P: AsRef<Path>,
        F: FnMut(&Path, bool) -> Result<WalkState, Error>,
    {
        self.walk_impl(root.as_ref(), false, visitor)
    }

    /// Like [`walk`], with the match test inverted: only entries matching
    /// the list are visited, and non-matching directories are pruned.
    ///
    /// [`walk`]: IgnoreList::walk
    pub fn walk_inverted<P, F>(&self, root: P, visitor: F) -> Result<(), Error>
    where
        P: AsRef<Path>,
        F: FnMut(&Path, bool) -> Result<WalkState, Error>,
    {
        self.walk_impl(root.as_ref(), true, visitor)
    }

    fn walk_impl<F>(
        &self,
        root: &Path,
        invert: bool,
        mut visitor: F,
    ) -> Result<(), Error>
    where
        F: FnMut(&Path, bool) -> Result<WalkState, Error>,
    {
        // Matching always sees base-relative candidates, so the walk root
        // is re-expressed relative to the base once, up front. Walking a
        // tree outside the base yields `../`-prefixed candidates, which
        // unanchored patterns still apply to.
        let prefix = self.rel_to_base(root);
        let mut it = WalkDir::new(root).min_depth(1).into_iter();
        loop {
            let entry = match it.next() {
                None => return Ok(()),
                Some(Err(err)) => return Err(Error::from_walkdir(err)),
                Some(Ok(entry)) => entry,
            };
            let is_dir = entry.file_type().is_dir();
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => entry.path(),
            };
            let rel = pathutil::to_slash(rel);
            let candidate = if prefix.is_empty() {
                rel.into_owned()
            } else {
                format!("{}/{}", prefix, rel)
            };
            if self.matched(&candidate, is_dir) != invert {
                if is_dir {
                    it.skip_current_dir();
                }
                continue;
            }
            match visitor(entry.path(), is_dir)? {
                WalkState::Continue => {}
                WalkState::Skip => {
                    if is_dir {
                        it.skip_current_dir();
                    }
                }
                WalkState::Quit => return Ok(()),
            }
        }
    }
}
