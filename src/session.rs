use crate::git::{GitClient, GitFailure};
use crate::porcelain::{self, STATUS_ARGS};
use crate::surface::Display;
use crate::types::{is_protected_branch, RepoStatus};
use anyhow::Result;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::debug;

/// Pattern for branch names synthesized when pushing from a protected branch.
///
/// Supports `{user}` and `{timestamp}` placeholders; the timestamp renders as
/// `YYYYMMDD-HHMM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTemplate {
    pattern: String,
    user: String,
}

impl BranchTemplate {
    pub const WITH_USER: &'static str = "{user}/patch-{timestamp}";
    pub const ANONYMOUS: &'static str = "patch-{timestamp}";

    pub fn new(pattern: impl Into<String>, user: Option<&str>) -> Self {
        Self {
            pattern: pattern.into(),
            user: user.map(slugify).unwrap_or_default(),
        }
    }

    /// Default template for the given identity.
    pub fn seeded(user: Option<&str>) -> Self {
        let user = user.map(slugify).filter(|slug| !slug.is_empty());
        match user {
            Some(user) => Self {
                pattern: Self::WITH_USER.to_string(),
                user,
            },
            None => Self {
                pattern: Self::ANONYMOUS.to_string(),
                user: String::new(),
            },
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn render(&self, now: OffsetDateTime) -> String {
        let stamp = now
            .format(format_description!("[year][month][day]-[hour][minute]"))
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        let name = self
            .pattern
            .replace("{user}", &self.user)
            .replace("{timestamp}", &stamp);
        if name.is_empty() || is_protected_branch(&name) {
            format!("patch-{stamp}")
        } else {
            name
        }
    }

    pub fn render_now(&self) -> String {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.render(now)
    }
}

/// Ref-safe form of a user name: lowercase alphanumerics separated by single dashes.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// State of one open repository view.
pub struct Session {
    path: PathBuf,
    output: String,
    branch_template: BranchTemplate,
    remote: String,
    git: GitClient,
    closed: bool,
}

impl Session {
    pub fn new(
        path: impl Into<PathBuf>,
        git: GitClient,
        branch_template: BranchTemplate,
        remote: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            output: String::new(),
            branch_template,
            remote: remote.into(),
            git,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Text waiting to be flushed to the display.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Run git in the repository root; its output lands in the pending buffer.
    pub fn git(&mut self, args: &[&str]) -> Result<(), GitFailure> {
        self.git.run(&self.path, args, &mut self.output)
    }

    /// Run git and hand back its stdout instead of leaving it in the buffer.
    ///
    /// Stderr stays buffered. On failure everything stays buffered so the next flush
    /// shows it.
    pub fn query(&mut self, args: &[&str]) -> Result<String, GitFailure> {
        self.git.capture(&self.path, args, &mut self.output)
    }

    pub fn status(&mut self) -> Result<RepoStatus, GitFailure> {
        self.query(&STATUS_ARGS).map(|report| porcelain::parse(&report))
    }

    /// [`Session::query`] that leaves no trace in the buffer.
    pub fn lookup(&mut self, args: &[&str]) -> Option<String> {
        self.quietly(|s| s.query(args))
    }

    /// [`Session::status`] that leaves no trace in the buffer.
    pub fn lookup_status(&mut self) -> Option<RepoStatus> {
        self.quietly(Session::status)
    }

    fn quietly<T>(
        &mut self,
        run: impl FnOnce(&mut Self) -> Result<T, GitFailure>,
    ) -> Option<T> {
        let start = self.output.len();
        let result = run(self);
        self.output.truncate(start);
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(error = %err, "lookup failed");
                None
            }
        }
    }

    pub fn synthesize_branch(&self) -> String {
        self.branch_template.render_now()
    }

    /// Replace the display body with the pending buffer and empty it.
    pub fn flush(&mut self, display: &mut dyn Display) -> Result<()> {
        display.clear_body()?;
        display.write_body(&self.output)?;
        display.mark_clean()?;
        self.output.clear();
        Ok(())
    }

    /// Whether a change to `path` concerns this repository's working tree.
    pub fn owns(&self, path: &Path) -> bool {
        path.starts_with(&self.path) && path != self.path && !path.starts_with(self.path.join(".git"))
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
