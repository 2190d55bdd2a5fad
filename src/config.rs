use crate::git::user_identity;
use crate::session::BranchTemplate;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "gitpane")]
#[command(about = "Command-driven git status pane that stays in sync with the working tree")]
pub struct Config {
    /// Repository root (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// git binary to run
    #[arg(long, env = "GITPANE_GIT", default_value = "git")]
    pub git: PathBuf,

    /// Remote used by Push and TrackOrigin
    #[arg(long, env = "GITPANE_REMOTE", default_value = "origin")]
    pub remote: String,

    /// Name pattern for branches pushed from main/master ({user}, {timestamp})
    #[arg(long, env = "GITPANE_BRANCH_TEMPLATE")]
    pub branch_template: Option<String>,

    /// Do not refresh on external file changes
    #[arg(long)]
    pub no_watch: bool,

    /// Write debug logs to this file (filter with RUST_LOG)
    #[arg(long, env = "GITPANE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Absolute repository root.
    pub fn repo_root(&self) -> Result<PathBuf> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("failed to read current directory")?,
        };
        path.canonicalize()
            .with_context(|| format!("cannot open {}", path.display()))
    }

    pub fn branch_template(&self, root: &Path) -> BranchTemplate {
        let user = user_identity(root).or_else(|| std::env::var("USER").ok());
        match &self.branch_template {
            Some(pattern) => BranchTemplate::new(pattern.clone(), user.as_deref()),
            None => BranchTemplate::seeded(user.as_deref()),
        }
    }
}
