/// Turns crossterm key events into held-key state
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use lab3d_core::{Key, KeyState};

/// Map a terminal key code to a scene key
pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(c) => Some(Key::char(c)),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

/// Tracks which keys are held.
///
/// Terminals with the kitty keyboard protocol report releases and the state
/// follows them exactly. Others only send presses and auto-repeats, so a key
/// counts as held until `hold` passes without another event for it.
#[derive(Debug)]
pub struct KeyTracker {
    state: KeyState,
    reports_release: bool,
    hold: Duration,
    last_seen: HashMap<Key, Instant>,
}

impl KeyTracker {
    pub fn new(reports_release: bool, hold: Duration) -> Self {
        Self {
            state: KeyState::new(),
            reports_release,
            hold,
            last_seen: HashMap::new(),
        }
    }

    pub fn reports_release(&self) -> bool {
        self.reports_release
    }

    pub fn handle(&mut self, event: &KeyEvent, now: Instant) {
        let Some(key) = map_key(event.code) else {
            return;
        };
        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.state.press(key);
                self.last_seen.insert(key, now);
            }
            KeyEventKind::Release => {
                self.state.release(key);
                self.last_seen.remove(&key);
            }
        }
    }

    /// Release keys whose hold window has lapsed. No-op when releases are reported.
    pub fn expire(&mut self, now: Instant) {
        if self.reports_release {
            return;
        }
        let hold = self.hold;
        let state = &mut self.state;
        self.last_seen.retain(|key, seen| {
            let alive = now.saturating_duration_since(*seen) < hold;
            if !alive {
                state.release(*key);
            }
            alive
        });
    }

    /// Drop everything, e.g. after the terminal loses focus
    pub fn clear(&mut self) {
        self.state.release_all();
        self.state.end_frame();
        self.last_seen.clear();
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    pub fn end_frame(&mut self) {
        self.state.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn event(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_map_key() {
        assert_eq!(map_key(KeyCode::Char('W')), Some(Key::Char('w')));
        assert_eq!(map_key(KeyCode::Up), Some(Key::Up));
        assert_eq!(map_key(KeyCode::F(1)), None);
    }

    #[test]
    fn test_hold_window() {
        let start = Instant::now();
        let mut tracker = KeyTracker::new(false, Duration::from_millis(300));
        tracker.handle(&event(KeyCode::Char('w'), KeyEventKind::Press), start);
        assert!(tracker.state().is_held(Key::Char('w')));
        assert!(tracker.state().was_hit(Key::Char('w')));

        tracker.end_frame();
        tracker.expire(start + Duration::from_millis(200));
        assert!(tracker.state().is_held(Key::Char('w')));
        assert!(!tracker.state().was_hit(Key::Char('w')));

        // An auto-repeat extends the hold without a second hit
        tracker.handle(
            &event(KeyCode::Char('w'), KeyEventKind::Repeat),
            start + Duration::from_millis(250),
        );
        assert!(!tracker.state().was_hit(Key::Char('w')));
        tracker.expire(start + Duration::from_millis(500));
        assert!(tracker.state().is_held(Key::Char('w')));

        tracker.expire(start + Duration::from_millis(600));
        assert!(!tracker.state().is_held(Key::Char('w')));
    }

    #[test]
    fn test_release_events() {
        let start = Instant::now();
        let mut tracker = KeyTracker::new(true, Duration::from_millis(300));
        tracker.handle(&event(KeyCode::Left, KeyEventKind::Press), start);

        // Held for as long as no release arrives
        tracker.expire(start + Duration::from_secs(5));
        assert!(tracker.state().is_held(Key::Left));

        tracker.handle(
            &event(KeyCode::Left, KeyEventKind::Release),
            start + Duration::from_secs(6),
        );
        assert!(!tracker.state().is_held(Key::Left));
    }

    #[test]
    fn test_clear() {
        let mut tracker = KeyTracker::new(false, Duration::from_millis(300));
        tracker.handle(&event(KeyCode::Tab, KeyEventKind::Press), Instant::now());
        tracker.clear();
        assert!(tracker.state().is_empty());
    }
}
