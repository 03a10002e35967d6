use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use finterm_tui::config::Config;
use finterm_tui::session::Session;
use finterm_tui::ui;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone)]
struct TerminalCapabilities {
    color: bool,
    mouse: bool,
    alt_screen: bool,
}

impl TerminalCapabilities {
    fn detect() -> Self {
        let no_color = std::env::var("NO_COLOR")
            .ok()
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        let mouse = std::env::var("FINTERM_TUI_MOUSE")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let alt_screen = std::env::var("FINTERM_TUI_ALT_SCREEN")
            .ok()
            .map(|v| v != "0")
            .unwrap_or(true);
        Self {
            color: !no_color,
            mouse,
            alt_screen,
        }
    }
}

struct UiGuard {
    caps: TerminalCapabilities,
}

impl Drop for UiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = std::io::stdout();
        if self.caps.mouse {
            let _ = execute!(stdout, DisableMouseCapture);
        }
        if self.caps.alt_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let caps = TerminalCapabilities::detect();

    enable_raw_mode()?;
    let _guard = UiGuard { caps: caps.clone() };
    let mut stdout = std::io::stdout();
    if caps.alt_screen {
        execute!(stdout, EnterAlternateScreen)?;
    }
    if caps.mouse {
        execute!(stdout, EnableMouseCapture)?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut session = Session::new(Config::from_env());
    let mut last_frame = Instant::now() - FRAME_INTERVAL;

    loop {
        session.drain_events();

        if session.model.dirty && last_frame.elapsed() >= FRAME_INTERVAL {
            let signature = ui::frame_signature(&session.model);
            if signature != session.model.last_render_signature {
                terminal.draw(|frame| ui::draw(frame, &session.model, caps.color))?;
                session.model.last_render_signature = signature;
            }
            session.model.dirty = false;
            last_frame = Instant::now();
        }

        if event::poll(INPUT_POLL_INTERVAL)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Enter => {
                        if session.submit_line() {
                            break;
                        }
                    }
                    KeyCode::Backspace => {
                        session.model.input.pop();
                        session.model.dirty = true;
                    }
                    KeyCode::Esc => {
                        session.model.input.clear();
                        session.model.dirty = true;
                    }
                    KeyCode::Char(c) => {
                        if c == 'c' && key.modifiers.contains(KeyModifiers::CONTROL) {
                            break;
                        }
                        session.model.input.push(c);
                        session.model.dirty = true;
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
