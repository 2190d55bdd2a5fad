//! The display-surface protocol the engine drives.
//!
//! The window body, its tag and any other open file views belong to whoever implements
//! [`Display`]; the engine only issues these operations.

use crate::app::Event;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// An open file view, addressed by id and identified by the path it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInfo {
    pub id: ViewId,
    pub name: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCtl {
    /// Forget unsaved-modification state.
    Clean,
    /// Re-read contents from disk.
    Reload,
    Close,
}

pub trait Display {
    fn set_name(&mut self, name: &str) -> Result<()>;
    fn set_tag(&mut self, words: &str) -> Result<()>;
    fn clear_body(&mut self) -> Result<()>;
    fn write_body(&mut self, text: &str) -> Result<()>;
    fn mark_clean(&mut self) -> Result<()>;

    fn views(&self) -> Vec<ViewInfo>;
    fn control(&mut self, view: ViewId, ctl: ViewCtl) -> Result<()>;

    /// Default handling for a look nobody else claimed.
    fn look(&mut self, _text: &str) -> Result<bool> {
        Ok(false)
    }

    /// Translate raw terminal input into an engine event.
    fn handle_input(&mut self, _input: crossterm::event::Event) -> Result<Option<Event>> {
        Ok(None)
    }
}

/// Something that reacts to pointer lookups and executed command text.
///
/// Returning `false` leaves the event to the display's default behaviour.
pub trait EventHandler {
    fn on_look(&mut self, text: &str) -> Result<bool>;
    fn on_execute(&mut self, command: &str) -> Result<bool>;
}

/// Split command text into its name and trimmed argument.
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((name, arg)) => Some((name, arg.trim())),
        None => Some((text, "")),
    }
}

/// Regular file, not following symlinks.
pub fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_file())
        .unwrap_or(false)
}
