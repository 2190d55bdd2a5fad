use crate::commands::GitWindow;
use crate::config::Config;
use crate::git::GitClient;
use crate::screen::TerminalDisplay;
use crate::session::Session;
use crate::surface::{Display, EventHandler};
use crate::watcher::FileWatcher;
use anyhow::{bail, Context, Result};
use crossterm::event;
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How long after a command finishes file changes are still attributed to it.
const COMMAND_SETTLE: Duration = Duration::from_millis(500);

/// Everything the sync loop reacts to.
#[derive(Debug)]
pub enum Event {
    /// Command text executed by the user.
    Execute(String),
    /// Text the user pointed at.
    Look(String),
    /// A path changed on disk outside the engine.
    Modified(PathBuf),
    /// Raw terminal input for the display to interpret.
    Input(event::Event),
    /// The user deleted the git window.
    Delete,
    /// The modification stream broke.
    WatchFailed(String),
}

/// Process one event to completion.
pub fn handle_event<D: Display>(
    window: &mut GitWindow<D>,
    event: Event,
) -> Result<ControlFlow<()>> {
    match event {
        Event::Execute(text) => {
            if !window.on_execute(&text)? {
                debug!(text, "execute not handled");
            }
        }
        Event::Look(text) => {
            if !window.on_look(&text)? && !window.display_mut().look(&text)? {
                debug!(text, "look not handled");
            }
        }
        Event::Modified(path) if !window.session().owns(&path) => {}
        Event::Modified(path) if window.dispatched_within(COMMAND_SETTLE) => {
            trace!(path = %path.display(), "change follows a command, not refreshing");
        }
        Event::Modified(path) => {
            debug!(path = %path.display(), "external change, refreshing");
            window.refresh()?;
        }
        Event::Input(input) => {
            if let Some(next) = window.display_mut().handle_input(input)? {
                return handle_event(window, next);
            }
        }
        Event::Delete => return Ok(ControlFlow::Break(())),
        Event::WatchFailed(reason) => bail!("file watcher failed: {reason}"),
    }

    if window.is_closed() {
        Ok(ControlFlow::Break(()))
    } else {
        Ok(ControlFlow::Continue(()))
    }
}

/// Consume events until the window is deleted or every producer hangs up.
///
/// Changes already queued when a command finishes were made by that command, or are
/// covered by its own redraw, so they are dropped.
pub fn run_loop<D: Display>(window: &mut GitWindow<D>, events: &Receiver<Event>) -> Result<()> {
    let mut backlog = VecDeque::new();
    loop {
        let event = match backlog.pop_front() {
            Some(event) => event,
            None => match events.recv() {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        let before = window.last_dispatch();
        if handle_event(window, event)?.is_break() {
            info!("git window deleted");
            break;
        }
        if window.last_dispatch() != before {
            for queued in events.try_iter() {
                match queued {
                    Event::Modified(path) => {
                        trace!(path = %path.display(), "dropping change queued during command");
                    }
                    other => backlog.push_back(other),
                }
            }
        }
    }
    Ok(())
}

fn spawn_input_reader(events: Sender<Event>) -> Result<()> {
    thread::Builder::new()
        .name("input".to_string())
        .spawn(move || loop {
            let next = match event::read() {
                Ok(input) => Event::Input(input),
                Err(err) => {
                    warn!(error = %err, "terminal input failed");
                    Event::Delete
                }
            };
            let stop = matches!(next, Event::Delete);
            if events.send(next).is_err() || stop {
                break;
            }
        })
        .context("failed to spawn input thread")?;
    Ok(())
}

pub fn run(config: &Config) -> Result<()> {
    let root = config.repo_root()?;
    let template = config.branch_template(&root);
    info!(root = %root.display(), git = %config.git.display(), template = template.pattern(), "starting session");

    let git = GitClient::new(&config.git);
    let session = Session::new(root.clone(), git, template, config.remote.clone());

    let (tx, rx) = channel();
    let _watcher = if config.no_watch {
        None
    } else {
        Some(FileWatcher::new(&root, tx.clone()).context("failed to start file watcher")?)
    };

    let display = TerminalDisplay::enter(root)?;
    spawn_input_reader(tx)?;

    let mut window = GitWindow::new(session, display);
    let result = window.open().and_then(|()| run_loop(&mut window, &rx));
    window.into_display().leave()?;
    result
}
