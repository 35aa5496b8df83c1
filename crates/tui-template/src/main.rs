//! Template editor demo
//!
//! A single-line template editor built with crossterm and ratatui on top of `template-core`.
//! Placeholders are drawn as highlighted chips; typing an accepted name promotes it, editing a
//! chip decays it back into text.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p tui-template                    # default placeholder names
//! cargo run -p tui-template -- config.json     # SessionConfig JSON
//! ```
//!
//! A config file looks like:
//!
//! ```json
//! {
//!   "acceptedPlaceholders": ["Company Name", "Agent Name"],
//!   "initialTemplate": "Hi, this is [Agent Name] from [Company Name]."
//! }
//! ```
//!
//! # Logging
//!
//! Set `TEMPLATE_TUI_LOG=<dir>` to write a daily-rotated `tui-template.log` there. The filter
//! follows `RUST_LOG` (default `debug`).
//!
//! # Keys
//!
//! - Left/Right: move the caret (placeholders are crossed in one step)
//! - Home/End: start/end of the line
//! - Tab / Shift+Tab: select the next/previous placeholder in the palette
//! - Ctrl+P: insert the selected placeholder at the caret
//! - Mouse click: place the caret
//! - Backspace, Enter: edit
//! - Paste: typed in one character at a time
//! - Ctrl+X / Esc: quit and print the serialized template

use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env, fs,
    io::{self, stdout},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use template_core::{
    AcceptedSet, CaretAnchor, CaretPosition, Document, EditOutcome, SessionConfig, SpanKind,
    TemplateSession, ViewAdapter, ViewSnapshot,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PLACEHOLDERS: [&str; 4] = ["Company Name", "Agent Name", "First Name", "Last Name"];
const DEFAULT_TEMPLATE: &str = "Hi [First Name], this is [Agent Name] from [Company Name].";

/// Terminal projection of the template line.
///
/// Handles are render generations; a handle from an older frame no longer reports a caret.
#[derive(Debug, Default)]
struct TerminalView {
    snapshot: ViewSnapshot,
    caret: Option<CaretPosition>,
    generation: u64,
}

impl TerminalView {
    fn caret_column(&self) -> Option<usize> {
        self.caret.and_then(|caret| self.snapshot.column_of(caret))
    }

    fn click(&mut self, column: usize) -> Option<CaretPosition> {
        self.caret = self.snapshot.caret_at_column(column);
        self.caret
    }

    fn line(&self) -> Line<'static> {
        let spans: Vec<Span<'static>> = self
            .snapshot
            .spans
            .iter()
            .map(|span| match span.kind {
                SpanKind::Text => Span::raw(span.display.clone()),
                SpanKind::Placeholder => Span::styled(
                    span.display.clone(),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            })
            .collect();
        Line::from(spans)
    }
}

impl ViewAdapter for TerminalView {
    type Handle = u64;

    fn render(&mut self, document: &Document) -> u64 {
        self.snapshot = ViewSnapshot::from_document(document);
        self.generation += 1;
        self.generation
    }

    fn current_caret(&self, view: &u64) -> Option<CaretAnchor> {
        if *view != self.generation {
            return None;
        }
        self.caret.map(CaretAnchor::from)
    }

    fn set_caret(&mut self, view: &u64, caret: CaretPosition) {
        if *view == self.generation {
            self.caret = Some(caret);
        }
    }
}

struct App {
    session: TemplateSession,
    view: TerminalView,
    handle: u64,
    /// Index of the selected placeholder in the palette
    selected: usize,
    should_quit: bool,
    status_message: String,
    /// Latest serialized value, kept current by the session subscription
    value: Arc<Mutex<String>>,
    /// Text area of the last frame, for mouse hit testing
    editor_area: Rect,
}

impl App {
    fn new(config: SessionConfig) -> io::Result<Self> {
        let mut session = TemplateSession::new(config).map_err(io::Error::other)?;

        let value = Arc::new(Mutex::new(session.value()));
        let sink = Arc::clone(&value);
        session.subscribe(move |change| {
            if let Some(serialized) = &change.value
                && let Ok(mut slot) = sink.lock()
            {
                slot.clone_from(serialized);
            }
        });

        let mut view = TerminalView::default();
        let handle = session.render_into(&mut view);

        Ok(Self {
            session,
            view,
            handle,
            selected: 0,
            should_quit: false,
            status_message: String::new(),
            value,
            editor_area: Rect::default(),
        })
    }

    fn selected_name(&self) -> Option<String> {
        self.session.accepted().get(self.selected).map(str::to_string)
    }

    fn cycle_palette(&mut self, forward: bool) {
        let len = self.session.accepted().len();
        if len == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    fn refresh(&mut self) {
        self.handle = self.session.render_into(&mut self.view);
    }

    fn report(&mut self, outcome: EditOutcome) {
        self.status_message = match outcome.rule {
            Some(rule) if outcome.document_changed => format!("{rule:?}"),
            _ => String::new(),
        };
        self.refresh();
    }

    fn insert_selected(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        let anchor = self.view.current_caret(&self.handle);
        self.session.save_caret(anchor.as_ref());
        let outcome = self.session.insert_placeholder(&name);
        self.report(outcome);
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('x')) | (_, KeyCode::Esc) => {
                self.should_quit = true;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('p')) => self.insert_selected(),
            (_, KeyCode::Tab) => self.cycle_palette(true),
            (_, KeyCode::BackTab) => self.cycle_palette(false),
            (_, KeyCode::Left) => {
                self.session.move_left();
                self.refresh();
            }
            (_, KeyCode::Right) => {
                self.session.move_right();
                self.refresh();
            }
            (_, KeyCode::Home) => {
                self.session.move_home();
                self.refresh();
            }
            (_, KeyCode::End) => {
                self.session.move_end();
                self.refresh();
            }
            (_, KeyCode::Backspace) => {
                let outcome = self.session.backspace();
                self.report(outcome);
            }
            (_, KeyCode::Enter) => {
                let outcome = self.session.enter();
                self.report(outcome);
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                let outcome = self.session.type_char(c);
                self.report(outcome);
            }
            _ => {}
        }
    }

    fn handle_paste(&mut self, text: String) {
        let outcome = self.session.type_text(&text);
        self.report(outcome);
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let inner = self.editor_area.inner(Margin::new(1, 1));
        if mouse.row != inner.y || mouse.column < inner.x {
            return;
        }
        let column = usize::from(mouse.column - inner.x);
        if let Some(caret) = self.view.click(column) {
            self.session.set_caret(caret);
            self.refresh();
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // template line
                Constraint::Length(3), // palette
                Constraint::Min(1),    // serialized value
                Constraint::Length(1), // status line
                Constraint::Length(1), // shortcuts
            ])
            .split(frame.area());

        self.editor_area = chunks[0];
        self.render_editor(frame, chunks[0]);
        self.render_palette(frame, chunks[1]);
        self.render_value(frame, chunks[2]);
        self.render_status_line(frame, chunks[3]);
        self.render_shortcuts(frame, chunks[4]);
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let editor = Paragraph::new(self.view.line())
            .block(Block::default().borders(Borders::ALL).title(" Template "));
        frame.render_widget(editor, area);

        if let Some(column) = self.view.caret_column() {
            let max_x = area.width.saturating_sub(2);
            let x = u16::try_from(column).unwrap_or(u16::MAX).min(max_x);
            frame.set_cursor_position((area.x + 1 + x, area.y + 1));
        }
    }

    fn render_palette(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (index, name) in self.session.accepted().iter().enumerate() {
            let style = if index == self.selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(format!(" {name} "), style));
            spans.push(Span::raw(" "));
        }
        let palette = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title(" Placeholders "));
        frame.render_widget(palette, area);
    }

    fn render_value(&self, frame: &mut Frame, area: Rect) {
        let value = self
            .value
            .lock()
            .map(|value| value.clone())
            .unwrap_or_default();
        let widget =
            Paragraph::new(value).block(Block::default().borders(Borders::ALL).title(" Value "));
        frame.render_widget(widget, area);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let caret = self
            .session
            .caret()
            .map_or_else(|| "-".to_string(), |c| format!("{}:{}", c.run, c.offset));
        let status_text = if self.status_message.is_empty() {
            format!(
                "Runs:{} | Caret:{} | Version:{}",
                self.session.document().len(),
                caret,
                self.session.version()
            )
        } else {
            format!(
                "{} | Caret:{} | Version:{}",
                self.status_message,
                caret,
                self.session.version()
            )
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = "Tab/Shift-Tab:Select  Ctrl-P:Insert  Left/Right/Home/End:Move  Ctrl-X/Esc:Quit";
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

fn init_tracing() {
    let Some(dir) = env::var_os("TEMPLATE_TUI_LOG") else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let file_appender = tracing_appender::rolling::daily(dir, "tui-template.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}

fn load_config() -> io::Result<SessionConfig> {
    match env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(PathBuf::from(path))?;
            SessionConfig::from_json(&json).map_err(io::Error::other)
        }
        None => {
            let accepted = AcceptedSet::new(DEFAULT_PLACEHOLDERS).map_err(io::Error::other)?;
            Ok(SessionConfig::new(accepted, DEFAULT_TEMPLATE))
        }
    }
}

fn main() -> io::Result<()> {
    init_tracing();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            std::process::exit(1);
        }
    };
    let mut app = App::new(config)?;
    tracing::info!(
        placeholders = app.session.accepted().len(),
        "template editor started"
    );

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    match result {
        Ok(()) => {
            tracing::info!(version = app.session.version(), "template editor closed");
            println!("{}", app.session.value());
        }
        Err(err) => {
            tracing::error!(%err, "template editor failed");
            eprintln!("Error: {err}");
        }
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => app.handle_key_event(key),
                Event::Paste(text) => app.handle_paste(text),
                Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                _ => {}
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(template: &str) -> App {
        let accepted = AcceptedSet::new(DEFAULT_PLACEHOLDERS).unwrap();
        App::new(SessionConfig::new(accepted, template)).unwrap()
    }

    #[test]
    fn test_paste_types_through_the_normalizer() {
        let mut app = app("Hi ");
        app.handle_paste("First Name and more".to_string());
        assert_eq!(app.session.value(), "Hi [First Name] and more");
        assert_eq!(
            app.value.lock().unwrap().as_str(),
            "Hi [First Name] and more"
        );
    }

    #[test]
    fn test_terminal_view_caret_uses_display_cells() {
        let mut app = app("名前 ");
        app.refresh();
        assert_eq!(app.view.caret_column(), Some(5));
        assert_eq!(app.view.click(2), Some(CaretPosition::new(0, 1)));
    }
}
