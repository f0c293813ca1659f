//! Include and ignore overrides
//!
//! A pattern names a directory and matches that directory plus everything
//! below it, compared segment by segment. When several patterns match the
//! same directory the deepest one decides; an include and an ignore of equal
//! depth resolve in favour of the include. Directories named by an include
//! entry are always part of the result, whether or not anything in them
//! changed.
//!
//! The hook treats every kept directory as a whole subtree, so an ignore
//! pattern below a kept directory has to travel with the result as an
//! exclusion; see [`OverrideRules::exclusions`].
//!
//! Patterns that do not normalize to a valid directory are dropped with a
//! debug message and match nothing.

use deopt_core::HookDirectory;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Include,
    Ignore,
}

/// Parsed include and ignore lists
#[derive(Debug, Clone, Default)]
pub struct OverrideRules {
    include: Vec<HookDirectory>,
    ignore: Vec<HookDirectory>,
}

impl OverrideRules {
    /// Build rules from raw pattern lists
    pub fn new<S: AsRef<str>>(include: &[S], ignore: &[S]) -> Self {
        Self {
            include: parse_patterns("include", include),
            ignore: parse_patterns("ignore", ignore),
        }
    }

    /// Apply the rules to a candidate set
    pub fn apply(&self, candidates: &BTreeSet<HookDirectory>) -> BTreeSet<HookDirectory> {
        let mut result: BTreeSet<HookDirectory> = self.include.iter().cloned().collect();

        for candidate in candidates {
            if result.contains(candidate) {
                continue;
            }
            match self.verdict(candidate) {
                Some(Verdict::Ignore) => {
                    tracing::debug!(directory = %candidate, "Ignored by override");
                }
                Some(Verdict::Include) | None => {
                    result.insert(candidate.clone());
                }
            }
        }

        result
    }

    /// Ignore patterns that carve a subtree out of a kept directory
    ///
    /// An ignore pattern is returned when it sits strictly below an entry of
    /// `kept` and no include of equal or greater depth re-adds it. Ignore
    /// patterns outside every kept subtree have nothing to carve out.
    pub fn exclusions(&self, kept: &BTreeSet<HookDirectory>) -> BTreeSet<HookDirectory> {
        self.ignore
            .iter()
            .filter(|pattern| !kept.contains(*pattern))
            .filter(|pattern| kept.iter().any(|dir| dir.is_ancestor_of(pattern)))
            .filter(|pattern| self.verdict(pattern) == Some(Verdict::Ignore))
            .cloned()
            .collect()
    }

    /// Decision of the most specific matching pattern, if any
    fn verdict(&self, dir: &HookDirectory) -> Option<Verdict> {
        let deepest = |patterns: &[HookDirectory]| {
            patterns
                .iter()
                .filter(|p| p.covers(dir))
                .map(HookDirectory::depth)
                .max()
        };

        match (deepest(&self.include), deepest(&self.ignore)) {
            (None, None) => None,
            (Some(_), None) => Some(Verdict::Include),
            (None, Some(_)) => Some(Verdict::Ignore),
            (Some(inc), Some(ign)) if inc >= ign => Some(Verdict::Include),
            (Some(_), Some(_)) => Some(Verdict::Ignore),
        }
    }
}

fn parse_patterns<S: AsRef<str>>(list: &str, patterns: &[S]) -> Vec<HookDirectory> {
    patterns
        .iter()
        .filter_map(|raw| match HookDirectory::parse(raw.as_ref()) {
            Ok(dir) => Some(dir),
            Err(e) => {
                tracing::debug!(list, pattern = raw.as_ref(), error = %e, "Inert pattern");
                None
            }
        })
        .collect()
}

/// Apply include and ignore lists to a candidate set
///
/// ```
/// use deopt_core::HookDirectory;
/// use deopt_engine::rules::resolve;
/// use std::collections::BTreeSet;
///
/// let candidates: BTreeSet<HookDirectory> =
///     ["dom/base", "dom/bindings", "layout"].iter().map(|s| s.parse().unwrap()).collect();
/// let result = resolve(&candidates, &["gfx"], &["dom"]);
/// let names: Vec<&str> = result.iter().map(HookDirectory::as_str).collect();
/// assert_eq!(names, ["gfx", "layout"]);
/// ```
pub fn resolve<S: AsRef<str>>(
    candidates: &BTreeSet<HookDirectory>,
    include: &[S],
    ignore: &[S],
) -> BTreeSet<HookDirectory> {
    OverrideRules::new(include, ignore).apply(candidates)
}
