//! Parsing and rendering of `git status --porcelain=v2 --branch -uall`.
//!
//! See <https://git-scm.com/docs/git-status#_porcelain_format_version_2>.

use crate::types::{ChangedEntry, ConflictEntry, RenameEntry, RepoStatus};
use tracing::trace;

/// Arguments that produce the report [`parse`] understands.
pub const STATUS_ARGS: [&str; 4] = ["status", "--branch", "--porcelain=v2", "-uall"];

/// Parse a complete porcelain v2 report.
///
/// Lines are self-describing by their first character. Blank lines, ignored-file
/// records and anything unrecognised or truncated are skipped.
pub fn parse(report: &str) -> RepoStatus {
    let mut status = RepoStatus::default();

    for line in report.lines() {
        let Some(kind) = line.chars().next() else {
            continue;
        };

        let parsed = match kind {
            '#' => parse_header(line, &mut status),
            '1' => parse_changed(line).map(|entry| status.changed.push(entry)),
            '2' => parse_renamed(line).map(|entry| status.renamed.push(entry)),
            'u' => parse_unmerged(line).map(|entry| status.unmerged.push(entry)),
            '?' => parse_untracked(line).map(|path| status.untracked.push(path)),
            _ => None,
        };

        if parsed.is_none() {
            trace!(line, "skipping porcelain line");
        }
    }

    status
}

fn parse_header(line: &str, status: &mut RepoStatus) -> Option<()> {
    let mut fields = line.split_whitespace().skip(1);
    let key = fields.next()?;
    let value = fields.next()?;
    match key {
        "branch.head" => status.branch = value.to_string(),
        "branch.upstream" => status.upstream = value.to_string(),
        // branch.oid, branch.ab, stash
        _ => {}
    }
    Some(())
}

/// Fixed-width prefix shared by `1`, `2` and `u` records: `<t> <XY> <sub> `.
struct Prefix<'a> {
    xy: &'a str,
    sub: &'a str,
    rest: &'a str,
}

fn parse_prefix(line: &str) -> Option<Prefix<'_>> {
    Some(Prefix {
        xy: line.get(2..4)?,
        sub: line.get(5..9)?,
        rest: line.get(9..)?.strip_prefix(' ')?,
    })
}

/// Split `count` single-space separated fields off the front of `rest`, returning them and
/// whatever follows verbatim.
fn take_fields(rest: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut remainder = rest;
    for _ in 0..count {
        let (field, tail) = remainder.split_once(' ')?;
        fields.push(field);
        remainder = tail;
    }
    Some((fields, remainder))
}

fn parse_changed(line: &str) -> Option<ChangedEntry> {
    let prefix = parse_prefix(line)?;
    let (f, path) = take_fields(prefix.rest, 5)?;
    if path.is_empty() {
        return None;
    }
    Some(ChangedEntry {
        xy: prefix.xy.to_string(),
        sub: prefix.sub.to_string(),
        mode_head: f[0].to_string(),
        mode_index: f[1].to_string(),
        mode_worktree: f[2].to_string(),
        obj_head: f[3].to_string(),
        obj_index: f[4].to_string(),
        path: path.to_string(),
    })
}

fn parse_renamed(line: &str) -> Option<RenameEntry> {
    let prefix = parse_prefix(line)?;
    let (f, paths) = take_fields(prefix.rest, 6)?;
    // git separates the two paths with a tab; older fixtures may use a space
    let (path, orig_path) = paths
        .split_once('\t')
        .or_else(|| paths.split_once(' '))?;
    if path.is_empty() || orig_path.is_empty() {
        return None;
    }
    Some(RenameEntry {
        xy: prefix.xy.to_string(),
        sub: prefix.sub.to_string(),
        mode_head: f[0].to_string(),
        mode_index: f[1].to_string(),
        mode_worktree: f[2].to_string(),
        obj_head: f[3].to_string(),
        obj_index: f[4].to_string(),
        score: f[5].to_string(),
        path: path.to_string(),
        orig_path: orig_path.to_string(),
    })
}

fn parse_unmerged(line: &str) -> Option<ConflictEntry> {
    let prefix = parse_prefix(line)?;
    let (f, path) = take_fields(prefix.rest, 7)?;
    if path.is_empty() {
        return None;
    }
    Some(ConflictEntry {
        xy: prefix.xy.to_string(),
        sub: prefix.sub.to_string(),
        mode_base: f[0].to_string(),
        mode_ours: f[1].to_string(),
        mode_theirs: f[2].to_string(),
        mode_worktree: f[3].to_string(),
        obj_base: f[4].to_string(),
        obj_ours: f[5].to_string(),
        obj_theirs: f[6].to_string(),
        path: path.to_string(),
    })
}

fn parse_untracked(line: &str) -> Option<String> {
    let path = line.get(2..)?;
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

/// Render the actionable summary of a snapshot.
///
/// Every entry line is itself a command (`Add <path>`, `Unstage <path>`), indented by a
/// tab under its section heading. Empty sections are left out. Entries keep the order git
/// reported them in.
pub fn format_status(status: &RepoStatus) -> String {
    let (unstaged, staged): (Vec<&ChangedEntry>, Vec<&ChangedEntry>) = status
        .changed
        .iter()
        .partition(|entry| entry.has_staging_changes());

    let mut out = String::new();
    push_section(&mut out, "UNSTAGED", "Add", unstaged.iter().map(|e| e.path.as_str()));
    push_section(&mut out, "STAGED", "Unstage", staged.iter().map(|e| e.path.as_str()));
    push_section(
        &mut out,
        "UNTRACKED",
        "Add",
        status.untracked.iter().map(String::as_str),
    );
    out
}

fn push_section<'a>(
    out: &mut String,
    heading: &str,
    command: &str,
    paths: impl ExactSizeIterator<Item = &'a str>,
) {
    if paths.len() == 0 {
        return;
    }
    out.push_str(heading);
    out.push('\n');
    for path in paths {
        out.push('\t');
        out.push_str(command);
        out.push(' ');
        out.push_str(path);
        out.push('\n');
    }
}
