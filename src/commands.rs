//! Named commands a user can execute in the git window.
//!
//! Every command that changes the repository either redraws through [`get`] when git
//! succeeded, or flushes git's raw output and stops so the failure stays visible.

use crate::git::GitFailure;
use crate::porcelain::format_status;
use crate::session::Session;
use crate::surface::{is_regular_file, split_command, Display, EventHandler, ViewCtl, ViewInfo};
use crate::types::{is_protected_branch, PROTECTED_BRANCHES};
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub type Handler = fn(&mut Session, &mut dyn Display, &str) -> Result<()>;

pub struct Command {
    pub name: &'static str,
    pub run: Handler,
}

/// Words shown in the window tag.
pub const TAG: &str = "Get Diff Pull Rebase Push Ls Log Help Del";

/// Every command, in the order `Help` lists them.
pub static COMMANDS: &[Command] = &[
    Command { name: "Get", run: get },
    Command { name: "Add", run: add },
    Command { name: "Unstage", run: unstage },
    Command { name: "Commit", run: commit },
    Command { name: "Checkout", run: checkout },
    Command { name: "Push", run: push },
    Command { name: "Revert", run: revert },
    Command { name: "Diff", run: diff },
    Command { name: "Status", run: status },
    Command { name: "Log", run: log },
    Command { name: "Ls", run: ls },
    Command { name: "LsAll", run: ls_all },
    Command { name: "Branches", run: branches },
    Command { name: "Remote", run: remote },
    Command { name: "Fetch", run: fetch },
    Command { name: "Pull", run: pull },
    Command { name: "Rebase", run: rebase },
    Command { name: "TrackOrigin", run: track_origin },
    Command { name: "GetWindows", run: get_windows },
    Command { name: "DelWindows", run: del_windows },
    Command { name: "Help", run: help },
    Command { name: "Del", run: del },
];

pub fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.name == name)
}

/// The git window: one session bound to the display that shows it.
pub struct GitWindow<D> {
    session: Session,
    display: D,
    last_dispatch: Option<Instant>,
}

impl<D: Display> GitWindow<D> {
    pub fn new(session: Session, display: D) -> Self {
        Self {
            session,
            display,
            last_dispatch: None,
        }
    }

    /// Name the window, set its tag and draw the first status.
    pub fn open(&mut self) -> Result<()> {
        let name = self.session.path().join("+git");
        self.display.set_name(&name.to_string_lossy())?;
        self.display.set_tag(TAG)?;
        self.refresh()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_display(self) -> D {
        self.display
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// When the last dispatched command finished.
    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Whether a command finished less than `window` ago.
    pub fn dispatched_within(&self, window: Duration) -> bool {
        self.last_dispatch
            .is_some_and(|finished| finished.elapsed() < window)
    }

    pub fn refresh(&mut self) -> Result<()> {
        get(&mut self.session, &mut self.display, "")
    }

    /// Run the named command. Returns `false` for names outside [`COMMANDS`].
    pub fn dispatch(&mut self, name: &str, arg: &str) -> Result<bool> {
        let Some(command) = lookup(name) else {
            debug!(name, "unrecognized command");
            return Ok(false);
        };
        info!(command = command.name, arg, "dispatching");
        let result = (command.run)(&mut self.session, &mut self.display, arg);
        self.last_dispatch = Some(Instant::now());
        result?;
        Ok(true)
    }
}

impl<D: Display> EventHandler for GitWindow<D> {
    fn on_look(&mut self, _text: &str) -> Result<bool> {
        Ok(false)
    }

    fn on_execute(&mut self, command: &str) -> Result<bool> {
        match split_command(command) {
            Some((name, arg)) => self.dispatch(name, arg),
            None => Ok(false),
        }
    }
}

fn redraw_or_flush(
    s: &mut Session,
    d: &mut dyn Display,
    result: Result<(), GitFailure>,
) -> Result<()> {
    match result {
        Ok(()) => get(s, d, ""),
        Err(_) => s.flush(d),
    }
}

/// Run a read-only git command and show whatever it printed.
fn show(s: &mut Session, d: &mut dyn Display, args: &[&str]) -> Result<()> {
    if let Err(err) = s.git(args) {
        debug!(error = %err, "showing failed git output");
    }
    s.flush(d)
}

/// Paths named by a command argument.
///
/// An argument naming an existing path, or a path the status report mentions, is taken
/// whole, so `Add a b.txt` works for a file with a space in its name even after it was
/// deleted; otherwise it is split on whitespace.
fn path_args(s: &mut Session, arg: &str) -> Vec<String> {
    if arg.is_empty() {
        return Vec::new();
    }
    if !arg.contains(char::is_whitespace)
        || s.path().join(arg).symlink_metadata().is_ok()
        || reported_path(s, arg)
    {
        return vec![arg.to_string()];
    }
    arg.split_whitespace().map(str::to_string).collect()
}

fn reported_path(s: &mut Session, arg: &str) -> bool {
    s.lookup_status()
        .is_some_and(|status| status.paths().any(|path| path == arg))
}

fn git_with_paths(s: &mut Session, prefix: &[&str], paths: &[String]) -> Result<(), GitFailure> {
    let mut args: Vec<&str> = prefix.to_vec();
    args.extend(paths.iter().map(String::as_str));
    s.git(&args)
}

/// Open file views showing regular files inside the repository.
fn repo_views(s: &Session, d: &dyn Display) -> Vec<ViewInfo> {
    d.views()
        .into_iter()
        .filter(|view| view.name.starts_with(s.path()) && is_regular_file(&view.name))
        .collect()
}

fn control_repo_views(s: &Session, d: &mut dyn Display, ctl: ViewCtl) -> Result<()> {
    for view in repo_views(s, d) {
        debug!(view = %view.name.display(), ?ctl, "controlling view");
        d.control(view.id, ctl)?;
    }
    Ok(())
}

/// `main` or `master`, whichever the repository has.
fn main_branch_name(s: &mut Session) -> String {
    let Some(listing) = s.lookup(&["branch", "-l"]) else {
        return String::new();
    };
    listing
        .split_whitespace()
        .find(|word| PROTECTED_BRANCHES.contains(word))
        .unwrap_or_default()
        .to_string()
}

pub fn get(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    let status = match s.status() {
        Ok(status) => status,
        Err(_) => return s.flush(d),
    };
    debug!(?status, "status");

    let checkout = if status.on_protected_branch() {
        s.synthesize_branch()
    } else {
        main_branch_name(s)
    };
    s.write(&format!(
        "on {} tracking {}\nCheckout {}\nCommit commit_message\n",
        status.branch, status.upstream, checkout
    ));
    s.write(&format_status(&status));
    s.flush(d)
}

pub fn add(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let paths = path_args(s, arg);
    let result = git_with_paths(s, &["add", "--"], &paths);
    redraw_or_flush(s, d, result)
}

pub fn unstage(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let paths = path_args(s, arg);
    let result = git_with_paths(s, &["restore", "--staged", "--"], &paths);
    redraw_or_flush(s, d, result)
}

/// Commit with the argument as message; an `all:` prefix also stages tracked changes.
pub fn commit(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let (all, message) = match arg.strip_prefix("all:") {
        Some(rest) => (true, rest.trim_start()),
        None => (false, arg),
    };
    let mut args = vec!["commit"];
    if all {
        args.push("-a");
    }
    args.extend(["-m", message]);

    match s.git(&args) {
        Ok(()) => {
            s.write("\n");
            get(s, d, "")
        }
        Err(_) => s.flush(d),
    }
}

/// `<remote>/<branch>` split, when the prefix is a configured remote.
fn remote_branch<'a>(s: &mut Session, target: &'a str) -> Option<(&'a str, &'a str)> {
    let (remote, branch) = target.split_once('/')?;
    if branch.is_empty() {
        return None;
    }
    let remotes = s.lookup(&["remote"])?;
    remotes
        .lines()
        .any(|line| line.trim() == remote)
        .then_some((remote, branch))
}

/// Check out a protected branch as is; any other name is created or reset in place.
pub fn checkout(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let target = arg.trim();
    if target.is_empty() {
        s.write("Checkout needs a branch name\n");
        return s.flush(d);
    }

    let result = if is_protected_branch(target) {
        s.git(&["checkout", target])
    } else if let Some((_, branch)) = remote_branch(s, target) {
        s.git(&["checkout", "-B", branch, target])
    } else {
        s.git(&["checkout", "-B", target])
    };

    match result {
        Ok(()) => {
            control_repo_views(s, d, ViewCtl::Reload)?;
            get(s, d, "")
        }
        Err(_) => s.flush(d),
    }
}

/// Push the current branch to its namesake, or to a fresh branch when on main/master.
pub fn push(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    let status = match s.status() {
        Ok(status) => status,
        Err(_) => return s.flush(d),
    };

    let remote = s.remote().to_string();
    let mut args = vec!["push".to_string(), remote];
    let destination = if status.on_protected_branch() {
        let name = s.synthesize_branch();
        s.write(&format!(
            "pushing to remote branch {} instead of {}\n",
            name, status.branch
        ));
        name
    } else {
        if status.upstream.is_empty() {
            args.push("--set-upstream".to_string());
        }
        status.branch.clone()
    };
    args.push(format!("{}:{}", status.branch, destination));

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = s.git(&args);
    redraw_or_flush(s, d, result)
}

/// Restore paths from the index and refresh any file views showing them.
pub fn revert(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let files = path_args(s, arg);
    if git_with_paths(s, &["checkout", "--"], &files).is_err() {
        return s.flush(d);
    }

    let root = s.path().to_path_buf();
    let views = d.views();
    for file in &files {
        for view in views
            .iter()
            .filter(|view| view.name.starts_with(&root) && view.name.ends_with(file))
        {
            d.control(view.id, ViewCtl::Clean)?;
            d.control(view.id, ViewCtl::Reload)?;
            s.write(&format!("reverted {}\n", view.name.display()));
        }
    }
    get(s, d, "")
}

pub fn diff(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    show(s, d, &["diff"])
}

pub fn status(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    show(s, d, &["status"])
}

pub fn log(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let mut args = vec!["log"];
    if arg.is_empty() {
        args.push("-10");
    } else {
        args.extend(arg.split_whitespace());
    }
    show(s, d, &args)
}

/// Tracked files, without `vendor/` unless an argument is given.
pub fn ls(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    if let Ok(listing) = s.query(&["ls-files"]) {
        for line in listing.lines() {
            if arg.is_empty() && line.starts_with("vendor/") {
                continue;
            }
            s.write(line);
            s.write("\n");
        }
    }
    s.flush(d)
}

pub fn ls_all(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    ls(s, d, "all")
}

pub fn branches(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    show(s, d, &["branch", "-a"])
}

pub fn remote(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    show(s, d, &["remote", "-v"])
}

pub fn fetch(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    show(s, d, &["fetch"])
}

pub fn pull(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    match s.git(&["pull"]) {
        Ok(()) => {
            control_repo_views(s, d, ViewCtl::Reload)?;
            get(s, d, "")
        }
        Err(_) => s.flush(d),
    }
}

pub fn rebase(s: &mut Session, d: &mut dyn Display, arg: &str) -> Result<()> {
    let mut args = vec!["rebase"];
    args.extend(arg.split_whitespace());
    match s.git(&args) {
        Ok(()) => {
            control_repo_views(s, d, ViewCtl::Reload)?;
            get(s, d, "")
        }
        Err(_) => s.flush(d),
    }
}

/// Point the current branch at its namesake on the configured remote.
pub fn track_origin(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    let status = match s.status() {
        Ok(status) => status,
        Err(_) => return s.flush(d),
    };
    if status.on_protected_branch() || status.branch.starts_with('(') {
        s.write(&format!("not tracking a remote branch for {}\n", status.branch));
        return s.flush(d);
    }

    let upstream = format!("--set-upstream-to={}/{}", s.remote(), status.branch);
    show(s, d, &["branch", &upstream, &status.branch])
}

pub fn get_windows(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    control_repo_views(s, d, ViewCtl::Reload)
}

pub fn del_windows(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    control_repo_views(s, d, ViewCtl::Close)
}

pub fn help(s: &mut Session, d: &mut dyn Display, _arg: &str) -> Result<()> {
    for command in COMMANDS {
        s.write(&format!("command {}\n", command.name));
    }
    s.flush(d)
}

pub fn del(s: &mut Session, _d: &mut dyn Display, _arg: &str) -> Result<()> {
    s.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::StubRunner;
    use crate::git::GitClient;
    use crate::porcelain::STATUS_ARGS;
    use crate::session::BranchTemplate;
    use crate::surface::test_support::RecordingDisplay;
    use crate::surface::ViewId;
    use std::fs;
    use std::path::{Path, PathBuf};

    const OID: &str = "1111111111111111111111111111111111111111";

    fn status_report(branch: &str, upstream: Option<&str>) -> String {
        let mut report = format!("# branch.oid {OID}\n# branch.head {branch}\n");
        if let Some(upstream) = upstream {
            report.push_str(&format!("# branch.upstream {upstream}\n"));
        }
        report
    }

    fn window_at(
        root: &Path,
        display: RecordingDisplay,
    ) -> (GitWindow<RecordingDisplay>, StubRunner) {
        let stub = StubRunner::default();
        let session = Session::new(
            root,
            GitClient::with_runner("git", Box::new(stub.clone())),
            BranchTemplate::seeded(None),
            "origin",
        );
        (GitWindow::new(session, display), stub)
    }

    fn window() -> (GitWindow<RecordingDisplay>, StubRunner) {
        window_at(Path::new("/repo"), RecordingDisplay::default())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    fn status_call() -> Vec<String> {
        args(&STATUS_ARGS)
    }

    /// Queue the two git calls a redraw on a feature branch makes.
    fn queue_redraw(stub: &StubRunner, report: &str) {
        stub.ok(report);
        stub.ok("* feature/x\n  main\n");
    }

    #[test]
    fn get_writes_header_and_status() {
        let (mut window, stub) = window();
        let report = format!(
            "{}1 M. N... 100644 100644 100644 {OID} {OID} a.go\n1 .M N... 100644 100644 100644 {OID} {OID} b.go\n",
            status_report("feature/x", Some("origin/feature/x"))
        );
        queue_redraw(&stub, &report);

        assert!(window.dispatch("Get", "").unwrap());

        let body = &window.display().body;
        assert_eq!(
            body,
            "on feature/x tracking origin/feature/x\nCheckout main\nCommit commit_message\n\
             UNSTAGED\n\tAdd b.go\nSTAGED\n\tUnstage a.go\n"
        );
        assert_eq!(stub.calls(), vec![status_call(), args(&["branch", "-l"])]);
        assert!(window.session().output().is_empty());
    }

    #[test]
    fn get_on_main_suggests_synthesized_branch() {
        let (mut window, stub) = window();
        stub.ok(&status_report("main", Some("origin/main")));

        window.dispatch("Get", "").unwrap();

        let body = &window.display().body;
        let checkout_line = body.lines().nth(1).unwrap();
        assert!(checkout_line.starts_with("Checkout patch-"));
        assert_eq!(stub.calls(), vec![status_call()]);
    }

    #[test]
    fn get_failure_shows_git_output() {
        let (mut window, stub) = window();
        stub.fail("fatal: not a git repository\n");

        window.dispatch("Get", "").unwrap();

        assert_eq!(window.display().body, "fatal: not a git repository\n");
    }

    #[test]
    fn successful_add_redraws() {
        let (mut window, stub) = window();
        stub.ok(&status_report("feature/x", None));
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.dispatch("Add", "src/a.rs src/b.rs").unwrap();

        let calls = stub.calls();
        assert_eq!(calls[0], status_call());
        assert_eq!(calls[1], args(&["add", "--", "src/a.rs", "src/b.rs"]));
        assert_eq!(calls[2], status_call());
        assert!(window.display().body.starts_with("on feature/x"));
    }

    #[test]
    fn single_path_needs_no_status_lookup() {
        let (mut window, stub) = window();
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.dispatch("Add", "src/a.rs").unwrap();

        assert_eq!(stub.calls()[0], args(&["add", "--", "src/a.rs"]));
    }

    #[test]
    fn add_deleted_path_with_space_stays_whole() {
        let (mut window, stub) = window();
        let report = format!(
            "{}1 .D N... 100644 100644 000000 {OID} {OID} a b.txt\n",
            status_report("feature/x", None)
        );
        stub.ok(&report);
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.on_execute("\tAdd a b.txt").unwrap();

        assert_eq!(stub.calls()[1], args(&["add", "--", "a b.txt"]));
        assert!(window.display().body.starts_with("on feature/x"));
    }

    #[test]
    fn unstage_staged_deletion_with_space_stays_whole() {
        let (mut window, stub) = window();
        let report = format!(
            "{}1 D. N... 100644 000000 000000 {OID} {OID} a b.txt\n",
            status_report("feature/x", None)
        );
        stub.ok(&report);
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.on_execute("\tUnstage a b.txt").unwrap();

        assert_eq!(
            stub.calls()[1],
            args(&["restore", "--staged", "--", "a b.txt"])
        );
    }

    #[test]
    fn failed_path_lookup_leaves_no_trace() {
        let (mut window, stub) = window();
        stub.fail("fatal: index file corrupt\n");
        stub.fail("fatal: pathspec 'a' did not match any files\n");

        window.dispatch("Add", "a b.txt").unwrap();

        assert_eq!(stub.calls()[1], args(&["add", "--", "a", "b.txt"]));
        assert_eq!(
            window.display().body,
            "fatal: pathspec 'a' did not match any files\n"
        );
    }

    #[test]
    fn failed_add_flushes_error_without_redraw() {
        let (mut window, stub) = window();
        stub.fail("fatal: pathspec 'nope' did not match any files\n");

        window.dispatch("Add", "nope").unwrap();

        assert_eq!(stub.calls(), vec![args(&["add", "--", "nope"])]);
        assert_eq!(
            window.display().body,
            "fatal: pathspec 'nope' did not match any files\n"
        );
        assert_eq!(window.display().flushes, 1);
    }

    #[test]
    fn add_keeps_existing_path_with_space_whole() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("a b.txt"), "x").unwrap();
        let (mut window, stub) = window_at(dir.path(), RecordingDisplay::default());
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.on_execute("\tAdd a b.txt").unwrap();

        assert_eq!(stub.calls()[0], args(&["add", "--", "a b.txt"]));
    }

    #[test]
    fn unstage_restores_from_index() {
        let (mut window, stub) = window();
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.dispatch("Unstage", "a.go").unwrap();

        assert_eq!(
            stub.calls()[0],
            args(&["restore", "--staged", "--", "a.go"])
        );
        assert_eq!(stub.calls().len(), 3);
    }

    #[test]
    fn failed_unstage_does_not_redraw() {
        let (mut window, stub) = window();
        stub.fail("error: pathspec\n");

        window.dispatch("Unstage", "a.go").unwrap();

        assert_eq!(stub.calls().len(), 1);
        assert_eq!(window.display().body, "error: pathspec\n");
    }

    #[test]
    fn commit_with_all_prefix_stages_tracked_changes() {
        let (mut window, stub) = window();
        stub.ok("[feature/x abc1234] fix the thing\n");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.dispatch("Commit", "all: fix the thing").unwrap();

        assert_eq!(
            stub.calls()[0],
            args(&["commit", "-a", "-m", "fix the thing"])
        );
        let body = &window.display().body;
        assert!(body.starts_with("[feature/x abc1234] fix the thing\n\non feature/x"));
    }

    #[test]
    fn commit_without_prefix_uses_message_verbatim() {
        let (mut window, stub) = window();
        stub.fail("nothing to commit, working tree clean\n");

        window.dispatch("Commit", "allow: colons").unwrap();

        assert_eq!(stub.calls(), vec![args(&["commit", "-m", "allow: colons"])]);
        assert_eq!(window.display().body, "nothing to commit, working tree clean\n");
    }

    #[test]
    fn checkout_protected_branch_does_not_force_create() {
        let (mut window, stub) = window();
        stub.ok("Switched to branch 'main'\n");
        stub.ok(&status_report("main", Some("origin/main")));

        window.dispatch("Checkout", "main").unwrap();

        assert_eq!(stub.calls()[0], args(&["checkout", "main"]));
        assert!(!stub.calls()[0].contains(&"-B".to_string()));
    }

    #[test]
    fn checkout_other_branch_force_creates() {
        let (mut window, stub) = window();
        stub.ok("Switched to a new branch 'topic'\n");
        queue_redraw(&stub, &status_report("topic", None));

        window.dispatch("Checkout", "topic").unwrap();

        assert_eq!(stub.calls()[0], args(&["checkout", "-B", "topic"]));
    }

    #[test]
    fn checkout_slashed_local_name_force_creates() {
        let (mut window, stub) = window();
        stub.ok("origin\n");
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.dispatch("Checkout", "feature/x").unwrap();

        assert_eq!(stub.calls()[0], args(&["remote"]));
        assert_eq!(stub.calls()[1], args(&["checkout", "-B", "feature/x"]));
    }

    #[test]
    fn failed_remote_listing_does_not_leak_into_body() {
        let (mut window, stub) = window();
        stub.fail("fatal: unable to read config\n");
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", None));

        window.dispatch("Checkout", "feature/x").unwrap();

        assert_eq!(stub.calls()[1], args(&["checkout", "-B", "feature/x"]));
        assert!(window.display().body.starts_with("on feature/x"));
        assert!(!window.display().body.contains("unable to read config"));
    }

    #[test]
    fn checkout_remote_branch_creates_local_namesake() {
        let (mut window, stub) = window();
        stub.ok("origin\nupstream\n");
        stub.ok("");
        queue_redraw(&stub, &status_report("topic", Some("origin/topic")));

        window.dispatch("Checkout", "origin/topic").unwrap();

        assert_eq!(
            stub.calls()[1],
            args(&["checkout", "-B", "topic", "origin/topic"])
        );
    }

    #[test]
    fn checkout_reloads_regular_file_views_in_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        fs::write(root.join("a.rs"), "fn a() {}").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        let display = RecordingDisplay::with_views(&[
            root.join("a.rs"),
            root.join("sub"),
            PathBuf::from("/elsewhere/a.rs"),
        ]);
        let (mut window, stub) = window_at(&root, display);
        stub.ok("");
        queue_redraw(&stub, &status_report("topic", None));

        window.dispatch("Checkout", "topic").unwrap();

        assert_eq!(window.display().controls, vec![(ViewId(1), ViewCtl::Reload)]);
    }

    #[test]
    fn failed_checkout_leaves_views_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        let display = RecordingDisplay::with_views(&[dir.path().join("a.rs")]);
        let (mut window, stub) = window_at(dir.path(), display);
        stub.fail("error: Your local changes would be overwritten\n");

        window.dispatch("Checkout", "topic").unwrap();

        assert!(window.display().controls.is_empty());
        assert_eq!(stub.calls().len(), 1);
    }

    #[test]
    fn push_from_main_targets_synthesized_branch_without_upstream() {
        let (mut window, stub) = window();
        stub.ok(&status_report("main", Some("origin/main")));
        stub.ok("");
        stub.ok(&status_report("main", Some("origin/main")));

        window.dispatch("Push", "").unwrap();

        let push = &stub.calls()[1];
        assert_eq!(push[0], "push");
        assert_eq!(push[1], "origin");
        assert!(!push.contains(&"--set-upstream".to_string()));
        let refspec = push.last().unwrap();
        let (local, remote) = refspec.split_once(':').unwrap();
        assert_eq!(local, "main");
        assert!(remote.starts_with("patch-"));
        assert!(!is_protected_branch(remote));
        assert!(window
            .display()
            .body
            .starts_with(&format!("pushing to remote branch {remote} instead of main\n")));
    }

    #[test]
    fn first_push_of_feature_branch_sets_upstream() {
        let (mut window, stub) = window();
        stub.ok(&status_report("feature/x", None));
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", Some("origin/feature/x")));

        window.dispatch("Push", "").unwrap();

        assert_eq!(
            stub.calls()[1],
            args(&["push", "origin", "--set-upstream", "feature/x:feature/x"])
        );
    }

    #[test]
    fn later_push_of_tracked_branch_skips_upstream() {
        let (mut window, stub) = window();
        stub.ok(&status_report("feature/x", Some("origin/feature/x")));
        stub.ok("");
        queue_redraw(&stub, &status_report("feature/x", Some("origin/feature/x")));

        window.dispatch("Push", "").unwrap();

        assert_eq!(
            stub.calls()[1],
            args(&["push", "origin", "feature/x:feature/x"])
        );
    }

    #[test]
    fn failed_push_shows_rejection() {
        let (mut window, stub) = window();
        stub.ok(&status_report("feature/x", Some("origin/feature/x")));
        stub.fail(" ! [rejected] feature/x -> feature/x (non-fast-forward)\n");

        window.dispatch("Push", "").unwrap();

        assert_eq!(stub.calls().len(), 2);
        assert!(window.display().body.contains("[rejected]"));
    }

    #[test]
    fn revert_cleans_and_reloads_matching_views() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let display = RecordingDisplay::with_views(&[
            root.join("src/lib.rs"),
            root.join("src/other.rs"),
            PathBuf::from("/elsewhere/src/lib.rs"),
        ]);
        let (mut window, stub) = window_at(&root, display);
        stub.ok("");
        queue_redraw(&stub, &status_report("topic", None));

        window.dispatch("Revert", "src/lib.rs").unwrap();

        assert_eq!(stub.calls()[0], args(&["checkout", "--", "src/lib.rs"]));
        assert_eq!(
            window.display().controls,
            vec![(ViewId(1), ViewCtl::Clean), (ViewId(1), ViewCtl::Reload)]
        );
        let expected = format!("reverted {}\n", root.join("src/lib.rs").display());
        assert!(window.display().body.starts_with(&expected));
    }

    #[test]
    fn help_lists_every_command_in_table_order() {
        let (mut window, stub) = window();

        window.dispatch("Help", "").unwrap();

        let names: Vec<&str> = window
            .display()
            .body
            .lines()
            .map(|line| line.trim_start_matches("command "))
            .collect();
        let expected: Vec<&str> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(names, expected);
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn unknown_command_is_ignored() {
        let (mut window, stub) = window();

        assert!(!window.dispatch("Frobnicate", "now").unwrap());
        assert!(!window.on_execute("on feature/x tracking origin/feature/x").unwrap());
        assert!(stub.calls().is_empty());
        assert_eq!(window.display().flushes, 0);
    }

    #[test]
    fn failed_read_only_command_still_shows_output() {
        let (mut window, stub) = window();
        stub.fail("fatal: ambiguous argument 'nope'\n");

        window.dispatch("Log", "nope").unwrap();

        assert_eq!(window.display().body, "fatal: ambiguous argument 'nope'\n");
        assert_eq!(window.display().flushes, 1);
    }

    #[test]
    fn dispatch_records_when_command_finished() {
        let (mut window, stub) = window();
        stub.fail("fatal: ambiguous argument 'nope'\n");
        assert!(window.last_dispatch().is_none());

        window.dispatch("Frobnicate", "").unwrap();
        assert!(window.last_dispatch().is_none());

        window.dispatch("Log", "nope").unwrap();
        assert!(window.last_dispatch().is_some());
        assert!(window.dispatched_within(Duration::from_secs(60)));
        assert!(!window.dispatched_within(Duration::ZERO));
    }

    #[test]
    fn ls_hides_vendor_unless_asked() {
        let (mut window, stub) = window();
        stub.ok("src/main.rs\nvendor/dep/lib.rs\n");
        stub.ok("src/main.rs\nvendor/dep/lib.rs\n");

        window.dispatch("Ls", "").unwrap();
        assert_eq!(window.display().body, "src/main.rs\n");

        window.dispatch("LsAll", "").unwrap();
        assert_eq!(window.display().body, "src/main.rs\nvendor/dep/lib.rs\n");
    }

    #[test]
    fn log_defaults_to_last_ten() {
        let (mut window, stub) = window();
        stub.ok("commit abc\n");
        stub.ok("commit abc\n");

        window.dispatch("Log", "").unwrap();
        window.dispatch("Log", "--oneline -3").unwrap();

        assert_eq!(stub.calls()[0], args(&["log", "-10"]));
        assert_eq!(stub.calls()[1], args(&["log", "--oneline", "-3"]));
    }

    #[test]
    fn track_origin_skips_protected_branch() {
        let (mut window, stub) = window();
        stub.ok(&status_report("master", None));

        window.dispatch("TrackOrigin", "").unwrap();

        assert_eq!(stub.calls().len(), 1);
        assert!(window.display().body.contains("not tracking"));
    }

    #[test]
    fn track_origin_sets_upstream_for_feature_branch() {
        let (mut window, stub) = window();
        stub.ok(&status_report("feature/x", None));
        stub.ok("branch 'feature/x' set up to track 'origin/feature/x'.\n");

        window.dispatch("TrackOrigin", "").unwrap();

        assert_eq!(
            stub.calls()[1],
            args(&["branch", "--set-upstream-to=origin/feature/x", "feature/x"])
        );
    }

    #[test]
    fn del_windows_closes_repository_views() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        let display = RecordingDisplay::with_views(&[
            dir.path().join("a.rs"),
            PathBuf::from("/elsewhere/b.rs"),
        ]);
        let (mut window, _stub) = window_at(dir.path(), display);

        window.dispatch("DelWindows", "").unwrap();

        assert_eq!(window.display().controls, vec![(ViewId(1), ViewCtl::Close)]);
        assert_eq!(window.display().open_views.len(), 1);
    }

    #[test]
    fn del_closes_session() {
        let (mut window, _stub) = window();
        assert!(!window.is_closed());
        window.dispatch("Del", "").unwrap();
        assert!(window.is_closed());
    }

    #[test]
    fn open_names_window_and_draws_status() {
        let (mut window, stub) = window();
        queue_redraw(&stub, &status_report("feature/x", None));

        window.open().unwrap();

        assert_eq!(window.display().name, "/repo/+git");
        assert_eq!(window.display().tag, TAG);
        assert!(window.display().body.starts_with("on feature/x tracking \n"));
    }
}
