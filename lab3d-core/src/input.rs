/// Frontend-independent keyboard state
use std::collections::HashSet;

/// A key the scene controls can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Letters are stored lowercase, digits and punctuation as-is
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Tab,
    Escape,
}

impl Key {
    /// Build a character key, folding letters to lowercase
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }
}

/// Keys held down this frame, plus keys newly pressed this frame
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: HashSet<Key>,
    hit: HashSet<Key>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state with the given keys held (and none hit)
    pub fn holding(keys: &[Key]) -> Self {
        Self {
            held: keys.iter().copied().collect(),
            hit: HashSet::new(),
        }
    }

    /// Record a key going down. Only the first press counts as a hit.
    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) {
            self.hit.insert(key);
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// True if the key went down since the last `end_frame`
    pub fn was_hit(&self, key: Key) -> bool {
        self.hit.contains(&key)
    }

    pub fn held_keys(&self) -> impl Iterator<Item = &Key> {
        self.held.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty() && self.hit.is_empty()
    }

    /// Forget this frame's hits; held keys stay held
    pub fn end_frame(&mut self) {
        self.hit.clear();
    }
}
