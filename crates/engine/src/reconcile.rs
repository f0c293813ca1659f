//! Hook file reconciliation
//!
//! The hook file is a Python fragment executed by the build system for every
//! directory it configures. deopt owns a single delimited section of it:
//!
//! ```text
//! # >>> deopt: non-optimized directories >>>
//! NOOPT_DIRS = [
//!     "a",
//!     "b/c",
//! ]
//! NOOPT_EXCLUDE = [
//!     "b/c/gen",
//! ]
//! # <<< deopt <<<
//! ```
//!
//! Each entry covers its whole subtree. `NOOPT_EXCLUDE` keeps ignored
//! subtrees of a listed directory optimized; for any directory the deepest
//! matching entry decides.
//!
//! Everything outside the markers belongs to the user and is carried over
//! byte for byte. The section is only rewritten when the declarations differ
//! from the target, so an up-to-date file is never touched and its mtime does
//! not dirty the build.
//!
//! The lists only take effect through [`APPLY_SNIPPET`], which is written
//! once, when the section is created. A file whose snippet was removed or
//! predates `NOOPT_EXCLUDE` is reported with a warning on every reconcile.

use crate::resolver::ResolvedHookSet;
use deopt_core::HookDirectory;
use std::collections::BTreeSet;
use thiserror::Error;

/// First line of the managed section
pub const BEGIN_MARKER: &str = "# >>> deopt: non-optimized directories >>>";

/// Last line of the managed section
pub const END_MARKER: &str = "# <<< deopt <<<";

const DIRS_LIST: &str = "NOOPT_DIRS";
const EXCLUDE_LIST: &str = "NOOPT_EXCLUDE";
const LIST_CLOSE: &str = "]";

/// Python that applies the declarations, added once when the section is created
pub const APPLY_SNIPPET: &str = r#"_noopt_depth = -1
for _noopt_dir in NOOPT_EXCLUDE:
    if RELATIVEDIR == _noopt_dir or RELATIVEDIR.startswith(_noopt_dir + "/"):
        if _noopt_dir.count("/") > _noopt_depth:
            _noopt_depth = _noopt_dir.count("/")
for _noopt_dir in NOOPT_DIRS:
    if RELATIVEDIR == _noopt_dir or RELATIVEDIR.startswith(_noopt_dir + "/"):
        if _noopt_dir.count("/") >= _noopt_depth:
            COMPILE_FLAGS["OPTIMIZE"] = []
"#;

/// Loop lines a file needs for the declarations to do anything
const SNIPPET_LOOPS: [&str; 2] = [
    "for _noopt_dir in NOOPT_EXCLUDE:",
    "for _noopt_dir in NOOPT_DIRS:",
];

/// The managed section cannot be separated from the rest of the file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CorruptSection(String);

/// Result of reconciling a hook file against a target set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Content the file should have
    pub content: String,
    /// Whether `content` differs from what was passed in
    pub changed: bool,
}

/// Declarations parsed from a managed section
#[derive(Debug, Default, PartialEq, Eq)]
struct Declared {
    directories: BTreeSet<HookDirectory>,
    excluded: BTreeSet<HookDirectory>,
}

impl Declared {
    fn matches(&self, target: &ResolvedHookSet) -> bool {
        self.directories.iter().eq(target.iter()) && self.excluded.iter().eq(target.excluded())
    }
}

/// Managed section split out of a file
struct Section<'a> {
    before: &'a str,
    body: &'a str,
    after: &'a str,
}

/// Reconcile existing hook file content with `target`
///
/// An empty or hand-written file without a managed section gets one at the
/// top, followed by [`APPLY_SNIPPET`] and the previous content. Entries inside
/// a well-delimited section that cannot be parsed are discarded with a
/// warning and the section is regenerated in place.
///
/// # Errors
///
/// Returns [`CorruptSection`] if the markers are unbalanced, duplicated or
/// out of order.
pub fn reconcile(
    existing: &str,
    target: &ResolvedHookSet,
) -> std::result::Result<Reconciliation, CorruptSection> {
    let Some(section) = locate(existing)? else {
        let mut content = render_section(target);
        content.push_str(APPLY_SNIPPET);
        if !existing.is_empty() {
            content.push('\n');
            content.push_str(existing);
        }
        return Ok(Reconciliation {
            content,
            changed: true,
        });
    };

    if !applies_declarations(existing) {
        tracing::warn!(
            "The hook file does not apply NOOPT_DIRS and NOOPT_EXCLUDE; \
             delete the file to regenerate it"
        );
    }

    match parse_section(section.body) {
        Some(declared) if declared.matches(target) => {
            return Ok(Reconciliation {
                content: existing.to_string(),
                changed: false,
            });
        }
        Some(declared) => {
            tracing::debug!(
                declared = declared.directories.len(),
                target = target.len(),
                "Hook directories changed"
            );
        }
        None => {
            tracing::warn!("Discarding unreadable entries in the hook file section");
        }
    }

    let mut content = String::with_capacity(existing.len());
    content.push_str(section.before);
    content.push_str(&render_section(target));
    content.push_str(section.after);
    Ok(Reconciliation {
        content,
        changed: true,
    })
}

/// Directories currently declared in `content`
///
/// Returns `Ok(None)` if the file has no managed section or its entries are
/// unreadable.
pub fn declared_directories(
    content: &str,
) -> std::result::Result<Option<BTreeSet<HookDirectory>>, CorruptSection> {
    Ok(locate(content)?
        .and_then(|section| parse_section(section.body))
        .map(|declared| declared.directories))
}

/// Render the managed section, markers included
pub fn render_section(target: &ResolvedHookSet) -> String {
    let mut out = String::new();
    out.push_str(BEGIN_MARKER);
    out.push('\n');
    render_list(&mut out, DIRS_LIST, target.iter());
    render_list(&mut out, EXCLUDE_LIST, target.excluded());
    out.push_str(END_MARKER);
    out.push('\n');
    out
}

fn render_list<'a>(out: &mut String, name: &str, dirs: impl Iterator<Item = &'a HookDirectory>) {
    out.push_str(name);
    out.push_str(" = [\n");
    for dir in dirs {
        out.push_str("    \"");
        out.push_str(dir.as_str());
        out.push_str("\",\n");
    }
    out.push_str(LIST_CLOSE);
    out.push('\n');
}

fn applies_declarations(content: &str) -> bool {
    SNIPPET_LOOPS
        .iter()
        .all(|wanted| content.lines().any(|line| line.trim() == *wanted))
}

fn locate(content: &str) -> std::result::Result<Option<Section<'_>>, CorruptSection> {
    let corrupt = |reason: &str| CorruptSection(reason.to_string());

    let mut begin: Option<(usize, usize)> = None;
    let mut end: Option<(usize, usize)> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        match line.trim_end() {
            BEGIN_MARKER if begin.is_some() => return Err(corrupt("begin marker appears twice")),
            BEGIN_MARKER => begin = Some((start, offset)),
            END_MARKER if end.is_some() => return Err(corrupt("end marker appears twice")),
            END_MARKER => end = Some((start, offset)),
            _ => {}
        }
    }

    match (begin, end) {
        (None, None) => Ok(None),
        (Some((before_end, body_start)), Some((body_end, after_start)))
            if body_start <= body_end =>
        {
            Ok(Some(Section {
                before: &content[..before_end],
                body: &content[body_start..body_end],
                after: &content[after_start..],
            }))
        }
        (Some(_), Some(_)) => Err(corrupt("end marker precedes begin marker")),
        (Some(_), None) => Err(corrupt("begin marker without end marker")),
        (None, Some(_)) => Err(corrupt("end marker without begin marker")),
    }
}

fn parse_section(body: &str) -> Option<Declared> {
    let mut lines = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let directories = parse_list(&mut lines, DIRS_LIST)?;
    let excluded = parse_list(&mut lines, EXCLUDE_LIST)?;
    lines.next().is_none().then_some(Declared {
        directories,
        excluded,
    })
}

/// Parse `NAME = [ "dir", ... ]` or `NAME = []` from the next lines
fn parse_list<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    name: &str,
) -> Option<BTreeSet<HookDirectory>> {
    let rest = lines.next()?.strip_prefix(name)?.trim_start().strip_prefix('=')?.trim();
    match rest {
        "[]" => return Some(BTreeSet::new()),
        "[" => {}
        _ => return None,
    }

    let mut dirs = BTreeSet::new();
    loop {
        let line = lines.next()?;
        if line == LIST_CLOSE {
            return Some(dirs);
        }
        let entry = line.strip_suffix(',').unwrap_or(line).trim_end();
        let quoted = entry.strip_prefix('"')?.strip_suffix('"')?;
        dirs.insert(HookDirectory::parse(quoted).ok()?);
    }
}
