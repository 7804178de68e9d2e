mod details;
mod help;
mod state;

pub use details::detail_lines;
pub use state::{ItemStatus, MenuItem};

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::{Print, PrintStyledContent, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use state::{SelectorKey, SelectorState};
use std::io;

pub struct SelectorOutcome<V> {
    pub choice: Option<V>,
    /// Cursor at resolution, to restore it on the next run.
    pub cursor: usize,
}

/// Holds raw mode, and optionally the alternate screen, until dropped.
///
/// Every way out of a terminal screen (return, `?`, panic unwind) goes through `Drop`.
struct TerminalGuard {
    fullscreen: bool,
}

impl TerminalGuard {
    fn raw() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        Ok(Self { fullscreen: false })
    }

    fn fullscreen() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let guard = Self { fullscreen: true };
        execute!(io::stdout(), EnterAlternateScreen, Hide).context("enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.fullscreen {
            execute!(io::stdout(), Show, LeaveAlternateScreen).ok();
        }
        disable_raw_mode().ok();
    }
}

/// Show a menu and block until the user picks an item or quits.
pub fn select<V: Clone>(
    title: &str,
    items: Vec<MenuItem<V>>,
    cursor: usize,
) -> Result<SelectorOutcome<V>> {
    let mut state = SelectorState::new(title, items).with_cursor(cursor);

    let _guard = TerminalGuard::fullscreen()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let choice = state::drive(&mut state, read_key, |s| {
        terminal
            .draw(|f| draw_menu(f.area(), f, s))
            .context("draw menu")?;
        Ok(())
    })?;

    Ok(SelectorOutcome {
        choice,
        cursor: state.cursor(),
    })
}

/// Full-screen scrollable text; any key other than up/down goes back.
pub fn show_details(title: &str, lines: Vec<Line<'static>>) -> Result<()> {
    let _guard = TerminalGuard::fullscreen()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let max_scroll = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let mut scroll: u16 = 0;
    loop {
        terminal
            .draw(|f| draw_details(f.area(), f, title, &lines, scroll))
            .context("draw details")?;
        match read_key()? {
            SelectorKey::Up => scroll = scroll.saturating_sub(1),
            SelectorKey::Down => scroll = scroll.saturating_add(1).min(max_scroll),
            SelectorKey::Redraw => {}
            _ => return Ok(()),
        }
    }
}

/// Ask a yes/no question on the normal screen. Only an explicit yes counts.
pub fn confirm(message: &str) -> Result<bool> {
    let mut out = io::stdout();
    execute!(
        out,
        Print("\r\n"),
        PrintStyledContent("?".yellow()),
        Print(format!(" {message} ")),
        PrintStyledContent("(y/N)".dark_grey()),
        Print(" ")
    )
    .context("write prompt")?;

    let answer = {
        let _guard = TerminalGuard::raw()?;
        read_answer()?
    };
    execute!(out, Print(format!("{answer}\r\n"))).ok();
    Ok(is_affirmative(&answer))
}

/// Wait for any key press.
pub fn pause(message: &str) -> Result<()> {
    execute!(io::stdout(), PrintStyledContent(format!("  {message}").dark_grey()))
        .context("write prompt")?;
    {
        let _guard = TerminalGuard::raw()?;
        loop {
            if let Event::Key(k) = event::read().context("read terminal event")? {
                if k.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
    }
    execute!(io::stdout(), Print("\r\n")).ok();
    Ok(())
}

pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

/// Print a one-line status message on the normal screen.
pub fn say(tone: Tone, message: &str) {
    let styled = match tone {
        Tone::Success => message.green(),
        Tone::Info => message.dark_grey(),
        Tone::Warning => message.yellow(),
        Tone::Error => message.red(),
    };
    execute!(io::stdout(), Print("\n  "), PrintStyledContent(styled), Print("\n")).ok();
}

fn read_key() -> Result<SelectorKey> {
    loop {
        match event::read().context("read terminal event")? {
            Event::Key(k) if k.kind == KeyEventKind::Press => return Ok(key_from_event(&k)),
            Event::Resize(..) => return Ok(SelectorKey::Redraw),
            _ => {}
        }
    }
}

fn read_answer() -> Result<String> {
    loop {
        if let Event::Key(k) = event::read().context("read terminal event")? {
            if k.kind != KeyEventKind::Press {
                continue;
            }
            return Ok(match (k.modifiers, k.code) {
                (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => String::new(),
                (_, KeyCode::Char(c)) => c.to_string(),
                _ => String::new(),
            });
        }
    }
}

fn key_from_event(k: &KeyEvent) -> SelectorKey {
    match (k.modifiers, k.code) {
        (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => SelectorKey::Interrupt,
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => SelectorKey::Up,
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => SelectorKey::Down,
        (_, KeyCode::Enter) => SelectorKey::Confirm,
        (_, KeyCode::Char(' ')) => SelectorKey::Activate,
        (_, KeyCode::Char('q')) | (_, KeyCode::Char('Q')) | (_, KeyCode::Esc) => SelectorKey::Quit,
        _ => SelectorKey::Other,
    }
}

fn screen_block(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" {title} "),
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    ))
}

fn split_body_and_legend(area: Rect) -> (Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (rows[0], rows[1])
}

fn draw_menu<V: Clone>(area: Rect, f: &mut ratatui::Frame, state: &SelectorState<V>) {
    let (body, legend) = split_body_and_legend(area);
    let block = screen_block(state.title());

    if state.items().is_empty() {
        let p = Paragraph::new(Line::from(Span::styled(
            "No MCP servers found",
            Style::default().fg(Color::Yellow),
        )))
        .block(block);
        f.render_widget(p, body);
    } else {
        let items: Vec<ListItem> = state
            .items()
            .iter()
            .map(|item| {
                let mut spans = vec![Span::raw(item.label.clone())];
                if let Some(status) = item.status {
                    spans.push(Span::styled(
                        format!(" {}", status.glyph()),
                        Style::default().fg(status.color()),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default().with_selected(Some(state.cursor()));
        f.render_stateful_widget(list, body, &mut list_state);
    }

    f.render_widget(Paragraph::new(help::legend(help::MENU_KEYS)), legend);
}

fn draw_details(
    area: Rect,
    f: &mut ratatui::Frame,
    title: &str,
    lines: &[Line<'static>],
    scroll: u16,
) {
    let (body, legend) = split_body_and_legend(area);
    let p = Paragraph::new(lines.to_vec())
        .block(screen_block(title))
        .scroll((scroll, 0));
    f.render_widget(p, body);
    f.render_widget(Paragraph::new(help::legend(help::DETAIL_KEYS)), legend);
}
