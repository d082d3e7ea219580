pub mod console;
pub mod input;
pub mod ui;

use anyhow::Result;
use flume::Receiver;
use ratatui::{backend::CrosstermBackend, prelude::*};
use std::{
    io::{self, Stdout, Write},
    time::Duration,
};

use crossterm::{
    event::{Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::{core::bus::CoreToUi, protocol::runtime::CancelHandle};
use console::{Console, Flow};
use input::map_key;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Run the interactive session until the user quits or `cancel` fires.
/// The terminal is restored on every exit path.
pub fn run(console: &mut Console, cancel: &CancelHandle, core_rx: &Receiver<CoreToUi>) -> Result<()> {
    log::info!("[tui] starting");

    let session = TerminalSession::enter()?;
    let res = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| run_app(&mut terminal, console, cancel, core_rx));
    drop(session);

    log::info!("[tui] stopped");
    res
}

/// Raw mode plus alternate screen, undone on drop.
struct TerminalSession;

impl TerminalSession {
    fn enter() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        // Raw mode is on: from here the drop restores
        let session = Self;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = restore_terminal(&mut io::stdout()) {
            log::warn!("[tui] failed to restore terminal: {err}");
        }
    }
}

/// Leave the alternate screen and raw mode. Both steps run even when the
/// first fails; the first error is returned.
fn restore_terminal(out: &mut impl Write) -> io::Result<()> {
    let screen = crossterm::execute!(out, LeaveAlternateScreen);
    let raw = crossterm::terminal::disable_raw_mode();
    screen.and(raw)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    console: &mut Console,
    cancel: &CancelHandle,
    core_rx: &Receiver<CoreToUi>,
) -> Result<()> {
    loop {
        // Ticks only mean "redraw"; every iteration redraws anyway
        if core_rx.drain().any(|msg| msg == CoreToUi::Quit) || cancel.is_cancelled() {
            log::info!("[tui] cancellation requested");
            break;
        }

        terminal.draw(|f| ui::render(f, console))?;

        if !crossterm::event::poll(INPUT_POLL)? {
            continue;
        }
        let Event::Key(key) = crossterm::event::read()? else {
            continue;
        };
        // One physical press, one action
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if console.handle(map_key(key)) == Flow::Quit {
            break;
        }
    }

    terminal.clear()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn restore_leaves_alternate_screen() {
        let mut out = Vec::new();
        restore_terminal(&mut out).unwrap();
        assert_eq!(out, b"\x1b[?1049l");
    }

    #[test]
    fn restore_reports_a_failed_screen_write() {
        let err = restore_terminal(&mut BrokenPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
