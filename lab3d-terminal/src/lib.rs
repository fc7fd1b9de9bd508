/// Terminal frontend: keyboard in, ASCII frames out
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use lab3d_core::{FrameStats, Scene};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod keyboard;
pub mod renderer;

pub use keyboard::KeyTracker;
pub use renderer::AsciiRenderer;

/// Rows kept free below the picture for the status line
const STATUS_ROWS: u16 = 1;

/// Longest frame step fed to the scene, so a stall doesn't fling objects away
const MAX_FRAME_STEP: f32 = 0.1;

/// Frame pacing and key-hold settings
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub target_fps: u32,
    /// How long a key stays held without repeats when releases aren't reported
    pub hold: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            hold: Duration::from_millis(300),
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    config: AppConfig,
    renderer: AsciiRenderer,
    keys: KeyTracker,
    stats: FrameStats,
    running: bool,
}

impl TerminalApp {
    pub fn new(scene: Scene, config: AppConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let mut app = Self {
            scene,
            config,
            renderer: AsciiRenderer::new(0, 0),
            keys: KeyTracker::new(false, config.hold),
            stats: FrameStats::new(),
            running: true,
        };
        app.resize(width, height);
        Ok(app)
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let result = self.run_raw();
        let restored = terminal::disable_raw_mode();
        result.and(restored)
    }

    fn run_raw(&mut self) -> io::Result<()> {
        let reports_release = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        self.keys = KeyTracker::new(reports_release, self.config.hold);
        log::info!("key release events available: {reports_release}");

        in_alternate_screen(&mut stdout(), reports_release, || self.main_loop())
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_secs_f32(1.0 / self.config.target_fps.max(1) as f32);
        let mut last_frame = Instant::now();

        while self.running {
            let frame_start = Instant::now();
            let dt = (frame_start - last_frame).as_secs_f32();
            last_frame = frame_start;

            // Handle input
            while event::poll(Duration::ZERO)? {
                self.handle_event(event::read()?, Instant::now());
            }
            self.keys.expire(Instant::now());
            if !self.running {
                break;
            }

            // Update
            self.scene.update(self.keys.state(), dt.min(MAX_FRAME_STEP));
            self.keys.end_frame();
            if self.stats.tick(dt) {
                log::debug!("{}", self.stats.summary());
            }

            // Render
            self.render()?;

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if is_quit(&key) => self.running = false,
            Event::Key(key) => self.keys.handle(&key, now),
            Event::Resize(width, height) => self.resize(width, height),
            Event::FocusLost => self.keys.clear(),
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let rows = height.saturating_sub(STATUS_ROWS);
        self.renderer.resize(width as usize, rows as usize);
        if rows > 0 && width > 0 {
            self.scene.camera.projection.aspect = self.renderer.aspect();
        }
        log::debug!("viewport {width}x{rows}, aspect {:.3}", self.renderer.aspect());
    }

    fn render(&mut self) -> io::Result<()> {
        self.scene.render(&mut self.renderer);

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Status line under the picture
        queue!(
            stdout,
            cursor::MoveTo(0, self.renderer.height() as u16),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        stdout.flush()
    }

    fn status_line(&self) -> String {
        let controlled = self.scene.controlled().map_or("-", |m| m.name.as_str());
        let orbits = if self.scene.orbits_paused() { " (paused)" } else { "" };
        let line = format!(
            "{} | Model: {controlled}{orbits} | Tab=Next Model 1=Pause Lights Esc=Quit",
            self.stats.summary()
        );
        line.chars().take(self.renderer.width()).collect()
    }
}

/// Run `body` on the alternate screen with the cursor hidden, optionally with
/// key release reporting. The screen and cursor are restored whatever fails.
fn in_alternate_screen<W: Write>(
    out: &mut W,
    enhance_keys: bool,
    body: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;

    let result = if enhance_keys {
        execute!(
            out,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .and_then(|()| {
            let result = body();
            let popped = execute!(out, PopKeyboardEnhancementFlags);
            result.and(popped)
        })
    } else {
        body()
    };

    // Cleanup
    let restored = execute!(out, terminal::LeaveAlternateScreen, cursor::Show);
    result.and(restored)
}

/// Esc, or Ctrl-C since raw mode swallows the signal. Q is a camera key.
fn is_quit(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn screen_output(enhance_keys: bool) -> (io::Result<()>, String) {
        let mut out = Vec::new();
        let result = in_alternate_screen(&mut out, enhance_keys, || {
            Err(io::Error::new(io::ErrorKind::Other, "frame failed"))
        });
        (result, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_screen_restored_after_error() {
        for enhance_keys in [false, true] {
            let (result, written) = screen_output(enhance_keys);
            assert_eq!(result.unwrap_err().to_string(), "frame failed");

            let leave = written.find("\x1b[?1049l").unwrap();
            let show = written.find("\x1b[?25h").unwrap();
            assert!(written.find("\x1b[?1049h").unwrap() < leave);
            assert!(leave < show);
            assert_eq!(written.contains("\x1b[<1u"), enhance_keys);
        }
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit(&key(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Press)));
        assert!(is_quit(&key(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
            KeyEventKind::Press
        )));
        assert!(!is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Press)));
        assert!(!is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Press)));
        assert!(!is_quit(&key(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Release)));
    }
}
