//! Terminal implementation of the display surface.

use crate::app::Event;
use crate::surface::{is_regular_file, split_command, Display, EventHandler, ViewCtl, ViewId, ViewInfo};
use crate::ui;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::fs;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Body,
    View,
}

/// Read-only view of one file.
#[derive(Debug, Clone)]
pub struct FileView {
    pub id: ViewId,
    pub path: PathBuf,
    pub content: ViewContent,
    pub dirty: bool,
    pub scroll: usize,
    closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewContent {
    Text(Vec<String>),
    Binary,
    Unreadable(String),
}

impl FileView {
    pub fn open(id: ViewId, path: PathBuf) -> Self {
        let content = load(&path);
        Self {
            id,
            path,
            content,
            dirty: false,
            scroll: 0,
            closed: false,
        }
    }

    pub fn reload(&mut self) {
        self.content = load(&self.path);
        self.dirty = false;
    }

    pub fn line_count(&self) -> usize {
        match &self.content {
            ViewContent::Text(lines) => lines.len(),
            _ => 0,
        }
    }
}

impl EventHandler for FileView {
    fn on_look(&mut self, _text: &str) -> Result<bool> {
        Ok(false)
    }

    fn on_execute(&mut self, command: &str) -> Result<bool> {
        match split_command(command) {
            Some(("Get", _)) => {
                self.reload();
                Ok(true)
            }
            Some(("Del", _)) => {
                self.closed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn load(path: &Path) -> ViewContent {
    match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => ViewContent::Text(text.lines().map(str::to_string).collect()),
            Err(_) => ViewContent::Binary,
        },
        Err(err) => ViewContent::Unreadable(err.to_string()),
    }
}

/// Everything the terminal shows, independent of the terminal itself.
#[derive(Debug)]
pub struct ScreenState {
    pub root: PathBuf,
    pub name: String,
    pub tag: String,
    pub body: Vec<String>,
    pub dirty: bool,
    pub highlight: usize,
    pub scroll: usize,
    pub input: String,
    pub views: Vec<FileView>,
    pub focus: Focus,
    pub body_area: Rect,
    next_view: u64,
}

impl ScreenState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            name: String::new(),
            tag: String::new(),
            body: Vec::new(),
            dirty: false,
            highlight: 0,
            scroll: 0,
            input: String::new(),
            views: Vec::new(),
            focus: Focus::Body,
            body_area: Rect::default(),
            next_view: 1,
        }
    }

    pub fn clear_body(&mut self) {
        self.body.clear();
        self.highlight = 0;
        self.scroll = 0;
        self.dirty = true;
    }

    pub fn write_body(&mut self, text: &str) {
        self.body.extend(text.lines().map(|line| line.replace('\t', "    ")));
        self.dirty = true;
    }

    pub fn highlighted_line(&self) -> Option<&str> {
        self.body.get(self.highlight).map(String::as_str)
    }

    pub fn active_view(&self) -> Option<&FileView> {
        self.views.last()
    }

    fn active_view_mut(&mut self) -> Option<&mut FileView> {
        self.views.last_mut()
    }

    pub fn view_infos(&self) -> Vec<ViewInfo> {
        self.views
            .iter()
            .map(|view| ViewInfo {
                id: view.id,
                name: view.path.clone(),
            })
            .collect()
    }

    pub fn control(&mut self, id: ViewId, ctl: ViewCtl) {
        let Some(index) = self.views.iter().position(|view| view.id == id) else {
            return;
        };
        match ctl {
            ViewCtl::Clean => self.views[index].dirty = false,
            ViewCtl::Reload => self.views[index].reload(),
            ViewCtl::Close => {
                self.views.remove(index);
            }
        }
        self.settle_focus();
    }

    /// Open (or bring forward) a view of the file named by `text`.
    pub fn look(&mut self, text: &str) -> bool {
        let Some(path) = resolve_look_target(&self.root, text) else {
            return false;
        };
        if let Some(index) = self.views.iter().position(|view| view.path == path) {
            let mut view = self.views.remove(index);
            view.reload();
            self.views.push(view);
        } else {
            let id = ViewId(self.next_view);
            self.next_view += 1;
            self.views.push(FileView::open(id, path));
        }
        self.focus = Focus::View;
        true
    }

    fn settle_focus(&mut self) {
        self.views.retain(|view| !view.closed);
        if self.views.is_empty() {
            self.focus = Focus::Body;
        }
    }

    fn close_active_view(&mut self) {
        self.views.pop();
        self.settle_focus();
    }

    fn move_highlight(&mut self, delta: isize) {
        if self.body.is_empty() {
            self.highlight = 0;
            return;
        }
        let max = self.body.len() - 1;
        self.highlight = self.highlight.saturating_add_signed(delta).min(max);
    }

    fn scroll_view(&mut self, delta: isize) {
        if let Some(view) = self.active_view_mut() {
            let max = view.line_count().saturating_sub(1);
            view.scroll = view.scroll.saturating_add_signed(delta).min(max);
        }
    }

    fn page(&self) -> isize {
        self.body_area.height.saturating_sub(2).max(1) as isize
    }

    fn scroll(&mut self, delta: isize) {
        match self.focus {
            Focus::Body => self.move_highlight(delta),
            Focus::View => self.scroll_view(delta),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Option<Event>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let event = match key.code {
            KeyCode::Char('c') if ctrl => Some(Event::Delete),
            KeyCode::Char('o') if ctrl => self
                .highlighted_line()
                .map(|line| Event::Look(line.trim().to_string())),
            KeyCode::Esc => {
                if self.focus == Focus::View {
                    self.close_active_view();
                    None
                } else {
                    Some(Event::Delete)
                }
            }
            KeyCode::Enter => self.submit()?,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Body if !self.views.is_empty() => Focus::View,
                    _ => Focus::Body,
                };
                None
            }
            KeyCode::Up => {
                self.scroll(-1);
                None
            }
            KeyCode::Down => {
                self.scroll(1);
                None
            }
            KeyCode::PageUp => {
                self.scroll(-self.page());
                None
            }
            KeyCode::PageDown => {
                self.scroll(self.page());
                None
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                None
            }
            _ => None,
        };
        Ok(event)
    }

    /// Enter: typed text first goes to the focused view, then to the window; with no text
    /// the highlighted body line is executed.
    fn submit(&mut self) -> Result<Option<Event>> {
        if !self.input.trim().is_empty() {
            let text = std::mem::take(&mut self.input);
            if self.focus == Focus::View {
                if let Some(view) = self.active_view_mut() {
                    if view.on_execute(&text)? {
                        self.settle_focus();
                        return Ok(None);
                    }
                }
            }
            return Ok(Some(Event::Execute(text.trim().to_string())));
        }
        self.input.clear();
        if self.focus == Focus::View {
            return Ok(None);
        }
        Ok(self
            .highlighted_line()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Event::Execute(line.to_string())))
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<Event> {
        let area = self.body_area;
        let inside = area.contains((mouse.column, mouse.row).into());
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.scroll(3);
                None
            }
            MouseEventKind::ScrollUp => {
                self.scroll(-3);
                None
            }
            MouseEventKind::Down(button) if inside => {
                // first row inside the border
                let row = mouse.row.checked_sub(area.y + 1)? as usize;
                let index = self.scroll + row;
                let line = self.body.get(index)?.trim().to_string();
                self.highlight = index;
                self.focus = Focus::Body;
                if line.is_empty() {
                    return None;
                }
                match button {
                    event::MouseButton::Left => Some(Event::Execute(line)),
                    event::MouseButton::Right => Some(Event::Look(line)),
                    event::MouseButton::Middle => None,
                }
            }
            _ => None,
        }
    }

    pub fn handle_input(&mut self, input: event::Event) -> Result<Option<Event>> {
        match input {
            event::Event::Key(key) => self.handle_key(key),
            event::Event::Mouse(mouse) => Ok(self.handle_mouse(mouse)),
            _ => Ok(None),
        }
    }
}

/// The regular file under `root` that `text` names, either whole or after a leading
/// command word (`Add src/lib.rs`).
pub fn resolve_look_target(root: &Path, text: &str) -> Option<PathBuf> {
    let text = text.trim();
    let after_word = text
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim());
    [Some(text), after_word]
        .into_iter()
        .flatten()
        .filter(|candidate| !candidate.is_empty())
        .filter_map(|candidate| root.join(candidate).canonicalize().ok())
        .find(|path| path.starts_with(root) && is_regular_file(path))
}

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: ScreenState,
}

impl TerminalDisplay {
    /// Take over the terminal.
    pub fn enter(root: PathBuf) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        let mut display = Self {
            terminal,
            state: ScreenState::new(root),
        };
        display.draw()?;
        Ok(display)
    }

    /// Give the terminal back.
    pub fn leave(mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.terminal.draw(|frame| ui::draw(frame, &mut self.state))?;
        Ok(())
    }
}

impl Display for TerminalDisplay {
    fn set_name(&mut self, name: &str) -> Result<()> {
        self.state.name = name.to_string();
        self.draw()
    }

    fn set_tag(&mut self, words: &str) -> Result<()> {
        self.state.tag = words.to_string();
        self.draw()
    }

    fn clear_body(&mut self) -> Result<()> {
        self.state.clear_body();
        Ok(())
    }

    fn write_body(&mut self, text: &str) -> Result<()> {
        self.state.write_body(text);
        self.draw()
    }

    fn mark_clean(&mut self) -> Result<()> {
        self.state.dirty = false;
        self.draw()
    }

    fn views(&self) -> Vec<ViewInfo> {
        self.state.view_infos()
    }

    fn control(&mut self, view: ViewId, ctl: ViewCtl) -> Result<()> {
        self.state.control(view, ctl);
        self.draw()
    }

    fn look(&mut self, text: &str) -> Result<bool> {
        let opened = self.state.look(text);
        self.draw()?;
        Ok(opened)
    }

    fn handle_input(&mut self, input: event::Event) -> Result<Option<Event>> {
        let next = self.state.handle_input(input)?;
        self.draw()?;
        Ok(next)
    }
}
