//! Terminal user interface for the dashboard
//!
//! One loop owns the [`Dashboard`]: it draws a frame, waits for the next
//! event, feeds it to the reducer and hands the resulting commands to the
//! [`EffectExecutor`]. Keyboard input arrives from a dedicated thread.

mod constants;
mod executor;
mod ui;

pub use executor::EffectExecutor;
pub use ui::render_ui;

use anyhow::Result;
use crossterm::{
    event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::dashboard::{Dashboard, Event, Key};

/// How long the input thread blocks before rechecking for shutdown
const INPUT_POLL: Duration = Duration::from_millis(250);

/// Setup the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    // Clear first so escape sequences don't leak to the shell
    terminal.clear()?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Run the dashboard in the real terminal until quit or external shutdown
///
/// `events` must be the receiving half of the channel the executor posts to.
pub async fn run_tui(
    dashboard: Dashboard,
    executor: EffectExecutor,
    events_tx: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Restore the terminal even if something panics
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let size = terminal.size()?;
    let _ = events_tx.send(Event::Resize {
        width: size.width,
        height: size.height,
    });
    spawn_input_thread(events_tx, executor.shutdown_token());

    let result = run_dashboard(&mut terminal, dashboard, &executor, events, shutdown_rx).await;

    executor.shutdown();
    restore_terminal(&mut terminal)?;
    result.map(drop)
}

/// Event loop, generic over the backend so tests can drive it headless
pub async fn run_dashboard<B: Backend>(
    terminal: &mut Terminal<B>,
    mut dashboard: Dashboard,
    executor: &EffectExecutor,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<Dashboard> {
    for command in dashboard.start() {
        let _ = executor.execute(command);
    }

    loop {
        terminal.draw(|f| ui::render_ui(f, &dashboard))?;

        let event = tokio::select! {
            Some(()) = shutdown_rx.recv() => {
                info!("External shutdown requested");
                break;
            }
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let mut quit = false;
        for command in dashboard.update(event) {
            quit |= executor.execute(command).is_break();
        }
        if quit {
            break;
        }
    }

    executor.shutdown();
    Ok(dashboard)
}

/// Forward terminal input as dashboard events until shutdown
fn spawn_input_thread(events: mpsc::UnboundedSender<Event>, shutdown: CancelToken) {
    std::thread::spawn(move || {
        while !shutdown.is_cancelled() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    warn!(error = %error, "Terminal input failed");
                    break;
                }
            }
            let event = match event::read() {
                Ok(event::Event::Key(key)) => map_key(key).map(Event::Key),
                Ok(event::Event::Resize(width, height)) => Some(Event::Resize { width, height }),
                Ok(_) => None,
                Err(error) => {
                    warn!(error = %error, "Terminal input failed");
                    break;
                }
            };
            if let Some(event) = event
                && events.send(event).is_err()
            {
                break;
            }
        }
        debug!("Input thread stopped");
    });
}

/// Translate a crossterm key press into a dashboard key
#[must_use]
pub fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    Some(match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::CtrlC,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Tab => Key::Tab,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    })
}
