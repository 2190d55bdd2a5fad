use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::{debug, warn};

/// Seam between the client and process spawning, so tests can replay canned output.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[OsString], cwd: &Path) -> io::Result<Output>;
}

#[derive(Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &Path, args: &[OsString], cwd: &Path) -> io::Result<Output> {
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_PAGER", "cat")
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
    }
}

/// A git invocation that did not succeed.
#[derive(Debug, Error)]
pub enum GitFailure {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("git {args} exited with {}", describe_exit(.code))]
    Exit { args: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Runs the version-control binary in the repository root.
///
/// Every git call made on behalf of a session goes through [`GitClient::run`].
pub struct GitClient {
    program: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl GitClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_runner(program, Box::new(ProcessCommandRunner))
    }

    pub fn with_runner(program: impl Into<PathBuf>, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Run `git <args>` in `cwd`, appending stdout then stderr to `out`.
    ///
    /// Output is appended even when the command fails.
    pub fn run(&self, cwd: &Path, args: &[&str], out: &mut String) -> Result<(), GitFailure> {
        let output = self.execute(cwd, args, out)?;
        out.push_str(&String::from_utf8_lossy(&output.stdout));
        out.push_str(&String::from_utf8_lossy(&output.stderr));
        check(args, &output)
    }

    /// Run `git <args>` in `cwd` and return its stdout.
    ///
    /// Stderr is appended to `out` either way; stdout joins it only when the command fails.
    pub fn capture(
        &self,
        cwd: &Path,
        args: &[&str],
        out: &mut String,
    ) -> Result<String, GitFailure> {
        let output = self.execute(cwd, args, out)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if let Err(failure) = check(args, &output) {
            out.push_str(&stdout);
            out.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(failure);
        }
        out.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(stdout)
    }

    fn execute(&self, cwd: &Path, args: &[&str], out: &mut String) -> Result<Output, GitFailure> {
        debug!(args = %args.join(" "), "running git");

        let argv: Vec<OsString> = args.iter().map(OsString::from).collect();
        self.runner.run(&self.program, &argv, cwd).map_err(|source| {
            warn!(program = %self.program.display(), error = %source, "failed to spawn git");
            let failure = GitFailure::Spawn {
                program: self.program.display().to_string(),
                source,
            };
            out.push_str(&failure.to_string());
            out.push('\n');
            failure
        })
    }
}

fn check(args: &[&str], output: &Output) -> Result<(), GitFailure> {
    if output.status.success() {
        return Ok(());
    }
    let joined = args.join(" ");
    debug!(args = %joined, code = ?output.status.code(), "git failed");
    Err(GitFailure::Exit {
        args: joined,
        code: output.status.code(),
    })
}

/// The configured `user.name` for the repository at `path`, if any.
pub fn user_identity(path: &Path) -> Option<String> {
    let config = match git2::Repository::open(path) {
        Ok(repo) => repo.config(),
        Err(_) => git2::Config::open_default(),
    };
    let name = config.ok()?.get_string("user.name").ok()?;
    let name = name.trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
