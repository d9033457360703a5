#![forbid(unsafe_code)]

//! Playback session lifecycle guard.
//!
//! RAII management of the terminal state a live player disturbs. Creating a
//! [`PlaybackSession`] prepares the screen (hide cursor, clear, home);
//! dropping it restores it (reset style, show cursor, park the cursor on
//! the row below the playback grid so the shell prompt lands cleanly).
//!
//! # Lifecycle Guarantees
//!
//! 1. **Drop restores state** - cleanup runs when the session is dropped,
//!    in reverse order of setup.
//! 2. **Panic safety** - a process-wide panic hook performs best-effort
//!    restoration before the default hook prints the panic message, so the
//!    message is readable instead of landing mid-grid with the cursor
//!    hidden.
//! 3. **Signal safety (unix)** - SIGINT and SIGTERM trigger the same
//!    best-effort restoration before the process exits with the
//!    conventional `128 + signal` status.
//!
//! # Escape Sequences Reference
//!
//! All sequences are emitted via Crossterm:
//!
//! | Step | Sequence |
//! |------|----------|
//! | Hide cursor | `CSI ? 25 l` |
//! | Clear screen | `CSI 2 J` |
//! | Cursor home | `CSI 1 ; 1 H` |
//! | Alternate screen (optional) | `CSI ? 1049 h` / `CSI ? 1049 l` |
//! | Reset style | `CSI 0 m` |
//! | Show cursor | `CSI ? 25 h` |

use std::io::{self, Write};
use std::sync::OnceLock;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Playback session configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Switch to the alternate screen buffer for the session, preserving
    /// the caller's scrollback. Off by default so short clips stay visible
    /// after playback ends.
    pub alternate_screen: bool,

    /// Rows the playback grid occupies. On exit the cursor is parked on the
    /// row just below the grid.
    pub grid_height: u16,
}

/// RAII guard around playback terminal state.
///
/// Only one session should exist at a time; a second one would fight the
/// first over cursor visibility and screen contents.
#[derive(Debug)]
pub struct PlaybackSession {
    options: SessionOptions,
    alternate_screen_enabled: bool,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl PlaybackSession {
    /// Prepare the terminal for playback.
    ///
    /// # Errors
    ///
    /// Returns an error if the setup sequences cannot be written.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();

        let mut session = Self {
            options,
            alternate_screen_enabled: false,
            #[cfg(unix)]
            signal_guard: Some(SignalGuard::new()?),
        };

        let mut stdout = io::stdout();

        if options.alternate_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            session.alternate_screen_enabled = true;
            #[cfg(feature = "tracing")]
            tracing::info!("alternate screen enabled");
        }

        crossterm::execute!(
            stdout,
            crossterm::cursor::Hide,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
            crossterm::cursor::MoveTo(0, 0),
        )?;
        #[cfg(feature = "tracing")]
        tracing::info!("playback session started");

        Ok(session)
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Cleanup helper (shared between drop and explicit cleanup).
    fn cleanup(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        let mut stdout = io::stdout();

        let _ = crossterm::execute!(
            stdout,
            crossterm::style::SetAttribute(crossterm::style::Attribute::Reset),
            crossterm::cursor::Show,
        );

        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
            #[cfg(feature = "tracing")]
            tracing::info!("alternate screen disabled");
        } else {
            // Park the cursor below the grid so the prompt does not land
            // mid-frame.
            let _ = crossterm::execute!(stdout, crossterm::cursor::MoveTo(0, self.options.grid_height));
            let _ = stdout.write_all(b"\n");
        }

        let _ = stdout.flush();
        #[cfg(feature = "tracing")]
        tracing::info!("playback session restored");
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(
        stdout,
        crossterm::style::SetAttribute(crossterm::style::Attribute::Reset),
        crossterm::cursor::Show,
        crossterm::terminal::LeaveAlternateScreen,
    );
    let _ = stdout.write_all(b"\n");
    let _ = stdout.flush();
}

#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new() -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGWINCH => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("SIGWINCH received");
                    }
                    SIGINT | SIGTERM => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("termination signal received, cleaning up");
                        best_effort_cleanup();
                        std::process::exit(128 + signal);
                    }
                    _ => {}
                }
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
