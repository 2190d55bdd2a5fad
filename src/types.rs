/// Snapshot of `git status --porcelain=v2 --branch` at one point in time.
///
/// A path shows up in at most one of the entry lists, since git partitions the report by
/// record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Current branch, or git's detached sentinel (`(detached)`) verbatim.
    pub branch: String,
    pub upstream: String,
    pub changed: Vec<ChangedEntry>,
    pub renamed: Vec<RenameEntry>,
    pub unmerged: Vec<ConflictEntry>,
    pub untracked: Vec<String>,
}

impl RepoStatus {
    /// Every path the report mentions, rename sources included.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        let changed = self.changed.iter().map(|e| e.path.as_str());
        let renamed = self
            .renamed
            .iter()
            .flat_map(|e| [e.path.as_str(), e.orig_path.as_str()]);
        let unmerged = self.unmerged.iter().map(|e| e.path.as_str());
        let untracked = self.untracked.iter().map(String::as_str);
        changed.chain(renamed).chain(unmerged).chain(untracked)
    }

    pub fn on_protected_branch(&self) -> bool {
        is_protected_branch(&self.branch)
    }
}

pub const PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

pub fn is_protected_branch(name: &str) -> bool {
    PROTECTED_BRANCHES.contains(&name)
}

/// Ordinary changed entry (`1` record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedEntry {
    pub xy: String,
    pub sub: String,
    pub mode_head: String,
    pub mode_index: String,
    pub mode_worktree: String,
    pub obj_head: String,
    pub obj_index: String,
    pub path: String,
}

impl ChangedEntry {
    /// Whether there is worktree work left to `git add`.
    ///
    /// Empirical: an unset index side or a modified worktree side. Not checked against
    /// the full XY table.
    pub fn has_staging_changes(&self) -> bool {
        let mut codes = self.xy.chars();
        let index = codes.next();
        let worktree = codes.next();
        index == Some('.') || worktree == Some('M')
    }
}

/// Renamed or copied entry (`2` record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    pub xy: String,
    pub sub: String,
    pub mode_head: String,
    pub mode_index: String,
    pub mode_worktree: String,
    pub obj_head: String,
    pub obj_index: String,
    /// `R<score>` or `C<score>`.
    pub score: String,
    pub path: String,
    /// Source of the rename/copy.
    pub orig_path: String,
}

/// Unmerged entry (`u` record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    pub xy: String,
    pub sub: String,
    pub mode_base: String,
    pub mode_ours: String,
    pub mode_theirs: String,
    pub mode_worktree: String,
    pub obj_base: String,
    pub obj_ours: String,
    pub obj_theirs: String,
    pub path: String,
}
