//! Reduce changed files to the directories that own them

use deopt_core::{ChangedPath, HookDirectory};

/// Containing directory of a changed file
///
/// Top-level files have no hook directory and yield `None`. Directories whose
/// names cannot be written into the hook file are also skipped, with a
/// warning, since the build system could never match them.
///
/// ```
/// use deopt_core::ChangedPath;
/// use deopt_engine::classify;
///
/// let dir = classify(&ChangedPath::new("dom/base/nsFoo.cpp")).unwrap();
/// assert_eq!(dir.as_str(), "dom/base");
/// assert!(classify(&ChangedPath::new("README.md")).is_none());
/// ```
pub fn classify(path: &ChangedPath) -> Option<HookDirectory> {
    let parent = path.parent()?;
    match HookDirectory::parse(parent) {
        Ok(dir) => Some(dir),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Skipping unclassifiable path");
            None
        }
    }
}
