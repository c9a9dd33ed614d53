/// Keyboard state tracker.
///
/// Tracks which keys are currently held down and reports them as logical
/// actions; edge detection happens in the controller's action latches.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::action::Action;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_NEXT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_PREVIOUS: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_FINISH: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('f'), KeyCode::Char('F')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_DURATION_UP: &[KeyCode] = &[KeyCode::Char('+'), KeyCode::Char('='), KeyCode::Up];
const KEYS_DURATION_DOWN: &[KeyCode] = &[KeyCode::Char('-'), KeyCode::Char('_'), KeyCode::Down];

pub fn keys_for(action: Action) -> &'static [KeyCode] {
    match action {
        Action::Confirm => KEYS_CONFIRM,
        Action::Next => KEYS_NEXT,
        Action::Previous => KEYS_PREVIOUS,
        Action::TogglePause => KEYS_PAUSE,
        Action::Restart => KEYS_RESTART,
        Action::Finish => KEYS_FINISH,
        Action::Quit => KEYS_QUIT,
        Action::DurationUp => KEYS_DURATION_UP,
        Action::DurationDown => KEYS_DURATION_DOWN,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Raw key events collected during drain, for Ctrl+C handling.
    raw_events: Vec<KeyEvent>,

    /// Set when the terminal reported a resize during the last drain.
    resized: Option<(u16, u16)>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            raw_events: Vec::with_capacity(8),
            resized: None,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the controller processes input.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();
        self.resized = None;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.apply_key(key, Instant::now()),
                Ok(Event::Resize(w, h)) => self.resized = Some((w, h)),
                _ => {}
            }
        }

        let now = Instant::now();
        self.expire(now);
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.contains_key(&code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Is any key bound to this action held?
    pub fn action_held(&self, action: Action) -> bool {
        self.any_held(keys_for(action))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// New terminal size if a resize was reported this frame.
    pub fn resized(&self) -> Option<(u16, u16)> {
        self.resized
    }

    // ── Internal ──

    fn apply_key(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Not trusted without enhancement; rely on timeout expiry
            }
            _ => {
                self.last_active.insert(key.code, at);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        // With real Release events keys stay down until released.
        if self.honor_release {
            return;
        }
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }
}
