/// Logical input actions and their debounce latches.
///
/// Devices only report *which actions are down right now*. Each action owns a
/// `{down, consumed}` latch:
///   - `observe(down)` records the device state; releasing clears `consumed`
///   - `take_edge()` fires once per press (down && !consumed), then consumes
///   - `is_down()` is the level query, true on every held frame
///
/// A press therefore has to go up→down again before an edge query can fire a
/// second time, however many frames the key stays held.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Confirm,
    Next,
    Previous,
    TogglePause,
    Restart,
    Finish,
    Quit,
    DurationUp,
    DurationDown,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Confirm,
        Action::Next,
        Action::Previous,
        Action::TogglePause,
        Action::Restart,
        Action::Finish,
        Action::Quit,
        Action::DurationUp,
        Action::DurationDown,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// How a binding fires: once per press, or on every held frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Trigger {
    #[default]
    Edge,
    Level,
}

impl Trigger {
    pub fn from_name(s: &str) -> Option<Trigger> {
        match s.trim().to_lowercase().as_str() {
            "edge" => Some(Trigger::Edge),
            "level" => Some(Trigger::Level),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionLatch {
    pub down: bool,
    pub consumed: bool,
}

impl ActionLatch {
    pub fn observe(&mut self, down: bool) {
        self.down = down;
        if !down {
            self.consumed = false;
        }
    }

    pub fn take_edge(&mut self) -> bool {
        if self.down && !self.consumed {
            self.consumed = true;
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ActionStates {
    latches: [ActionLatch; Action::ALL.len()],
}

impl ActionStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame of device state for one action.
    pub fn observe(&mut self, action: Action, down: bool) {
        self.latches[action.index()].observe(down);
    }

    /// Feed one frame of device state for every action at once.
    pub fn observe_all(&mut self, mut is_down: impl FnMut(Action) -> bool) {
        for action in Action::ALL {
            self.observe(action, is_down(action));
        }
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.latches[action.index()].down
    }

    pub fn take_edge(&mut self, action: Action) -> bool {
        self.latches[action.index()].take_edge()
    }

    /// Mark a held action as handled without firing it.
    pub fn consume(&mut self, action: Action) {
        let latch = &mut self.latches[action.index()];
        if latch.down {
            latch.consumed = true;
        }
    }

    #[allow(dead_code)]
    pub fn latch(&self, action: Action) -> ActionLatch {
        self.latches[action.index()]
    }

    /// Query with the given trigger. A level-triggered hit still marks the
    /// press consumed so it cannot also fire a later edge query.
    pub fn fired(&mut self, action: Action, trigger: Trigger) -> bool {
        match trigger {
            Trigger::Edge => self.take_edge(action),
            Trigger::Level => {
                let down = self.is_down(action);
                self.consume(action);
                down
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_fires_once_while_held() {
        let mut s = ActionStates::new();
        let mut fired = 0;
        for _ in 0..10 {
            s.observe(Action::Confirm, true);
            if s.take_edge(Action::Confirm) { fired += 1; }
        }
        assert_eq!(fired, 1);
        assert!(s.is_down(Action::Confirm));
    }

    #[test]
    fn release_rearms_edge() {
        let mut s = ActionStates::new();
        s.observe(Action::Next, true);
        assert!(s.take_edge(Action::Next));
        s.observe(Action::Next, false);
        assert_eq!(s.latch(Action::Next), ActionLatch::default());
        assert!(!s.take_edge(Action::Next));
        s.observe(Action::Next, true);
        assert!(s.take_edge(Action::Next));
    }

    #[test]
    fn level_query_ignores_consumption() {
        let mut s = ActionStates::new();
        s.observe(Action::Restart, true);
        assert!(s.take_edge(Action::Restart));
        assert!(s.is_down(Action::Restart));
        s.observe(Action::Restart, true);
        assert!(s.is_down(Action::Restart));
    }

    #[test]
    fn consume_blocks_later_edge() {
        let mut s = ActionStates::new();
        s.observe(Action::Confirm, true);
        s.consume(Action::Confirm);
        assert!(!s.take_edge(Action::Confirm));

        // Consuming an idle action is meaningless and must not stick.
        s.observe(Action::Confirm, false);
        s.consume(Action::Confirm);
        s.observe(Action::Confirm, true);
        assert!(s.take_edge(Action::Confirm));
    }

    #[test]
    fn level_trigger_fires_every_frame_and_consumes() {
        let mut s = ActionStates::new();
        s.observe(Action::Confirm, true);
        assert!(s.fired(Action::Confirm, Trigger::Level));
        s.observe(Action::Confirm, true);
        assert!(s.fired(Action::Confirm, Trigger::Level));
        assert!(!s.fired(Action::Confirm, Trigger::Edge));
        s.observe(Action::Confirm, false);
        assert!(!s.fired(Action::Confirm, Trigger::Level));
    }

    #[test]
    fn trigger_names() {
        assert_eq!(Trigger::from_name("edge"), Some(Trigger::Edge));
        assert_eq!(Trigger::from_name(" Level "), Some(Trigger::Level));
        assert_eq!(Trigger::from_name("pulse"), None);
    }

    #[test]
    fn actions_are_independent() {
        let mut s = ActionStates::new();
        s.observe_all(|a| a == Action::Previous || a == Action::TogglePause);
        assert!(s.take_edge(Action::Previous));
        assert!(!s.take_edge(Action::Next));
        assert!(s.take_edge(Action::TogglePause));
        assert!(!s.is_down(Action::Confirm));
    }
}
