/// Game mode controller: the session's single owner of mutable state.
///
/// ## Modes
///   Menu   --Confirm (edge)-->            Active
///   Active --declare_win() / Finish-->    Win
///   Win    --Confirm (edge or level)-->   Menu
///
/// Each frame the game loop feeds device state into `actions_mut()`, then
/// calls `process_input()`, `update(dt)` and finally `frame()` to get the
/// render decision. Modes are checked in the fixed order Menu, Win, Active,
/// so entering Active from the menu also runs Active's input handling on
/// the same frame.

use crate::domain::action::{Action, ActionStates, Trigger};
use crate::domain::catalog::{Catalog, ImageAsset};
use crate::domain::reveal::{RevealAnimator, DURATION_DEFAULT};
use crate::sim::event::GameEvent;

pub const MENU_LINES: [&str; 2] = ["Welcome to Pixelated", "Press ENTER to start"];
pub const WIN_MESSAGE: &str = "Thanks for playing!!!";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameMode {
    Menu,
    Active,
    Win,
}

/// Tunables the controller takes from configuration.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub duration: f32,
    pub duration_step: f32,
    pub win_confirm: Trigger,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            duration: DURATION_DEFAULT,
            duration_step: 0.5,
            win_confirm: Trigger::Edge,
        }
    }
}

/// What the presentation layer must draw this frame.
#[derive(Debug)]
pub enum Frame<'a> {
    Menu { lines: [&'static str; 2] },
    Active(ActiveFrame<'a>),
    /// Active mode with nothing to show.
    NoImages,
    Win { message: &'static str },
}

#[derive(Debug)]
pub struct ActiveFrame<'a> {
    pub image: &'a ImageAsset,
    pub pixel_size: f32,
    pub score_text: String,
    /// Only present once the image is fully revealed.
    pub answer: Option<String>,
    pub position: usize,
    pub total: usize,
    pub duration: f32,
    pub paused: bool,
}

pub struct Controller {
    mode: GameMode,
    catalog: Catalog,
    reveal: RevealAnimator,
    actions: ActionStates,
    settings: Settings,
    events: Vec<GameEvent>,
    quit: bool,
}

impl Controller {
    pub fn new(catalog: Catalog, settings: Settings) -> Self {
        Controller {
            mode: GameMode::Menu,
            catalog,
            reveal: RevealAnimator::new(settings.duration),
            actions: ActionStates::new(),
            settings,
            events: Vec::with_capacity(8),
            quit: false,
        }
    }

    #[allow(dead_code)]
    pub fn mode(&self) -> GameMode { self.mode }
    #[allow(dead_code)]
    pub fn catalog(&self) -> &Catalog { &self.catalog }
    #[allow(dead_code)]
    pub fn reveal(&self) -> &RevealAnimator { &self.reveal }
    pub fn quit_requested(&self) -> bool { self.quit }

    /// Latch set the input devices write into every frame.
    pub fn actions_mut(&mut self) -> &mut ActionStates {
        &mut self.actions
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// The explicit Active → Win transition. Ignored in other modes.
    pub fn declare_win(&mut self) -> bool {
        if self.mode != GameMode::Active {
            return false;
        }
        self.set_mode(GameMode::Win);
        true
    }

    pub fn process_input(&mut self) {
        // Quit shares keys with Finish; only the menu listens to it.
        if self.mode != GameMode::Menu {
            self.actions.consume(Action::Quit);
        }

        if self.mode == GameMode::Menu {
            if self.actions.take_edge(Action::Confirm) {
                self.set_mode(GameMode::Active);
            } else if self.actions.take_edge(Action::Quit) {
                self.quit = true;
            }
        }

        if self.mode == GameMode::Win && self.actions.fired(Action::Confirm, self.settings.win_confirm) {
            self.set_mode(GameMode::Menu);
        }

        if self.mode == GameMode::Active {
            self.process_active_input();
        }
    }

    /// Advance the reveal by `dt` seconds, in every mode. A running reveal
    /// keeps going behind the menu and win screens.
    pub fn update(&mut self, dt: f32) {
        if self.catalog.is_empty() {
            return;
        }
        if self.reveal.update(dt) {
            if let Ok(image) = self.catalog.current() {
                log::info!("Revealed '{}'", image.name);
            }
            self.events.push(GameEvent::RevealCompleted);
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        match self.mode {
            GameMode::Menu => Frame::Menu { lines: MENU_LINES },
            GameMode::Win => Frame::Win { message: WIN_MESSAGE },
            GameMode::Active => match self.catalog.current() {
                Ok(image) => Frame::Active(ActiveFrame {
                    image,
                    pixel_size: self.reveal.pixel_size(),
                    score_text: format!("Score: {}", self.reveal.score()),
                    answer: self.reveal.is_revealed().then(|| format!("ANSWER : {}", image.name)),
                    position: self.catalog.position(),
                    total: self.catalog.len(),
                    duration: self.reveal.duration(),
                    paused: self.reveal.is_paused(),
                }),
                Err(_) => Frame::NoImages,
            },
        }
    }

    // ── Internal ──

    fn process_active_input(&mut self) {
        // Confirm does nothing here; swallow it so a press that started in
        // Active cannot count as a fresh press once the mode changes.
        self.actions.consume(Action::Confirm);

        if self.actions.take_edge(Action::Next) && !self.catalog.is_empty() {
            self.catalog.advance();
            self.image_changed();
        }

        if self.actions.take_edge(Action::Previous) && !self.catalog.is_empty() {
            self.catalog.retreat();
            self.image_changed();
        }

        if self.actions.take_edge(Action::TogglePause) {
            self.reveal.toggle_pause();
            self.events.push(if self.reveal.is_paused() {
                GameEvent::RevealPaused
            } else {
                GameEvent::RevealStarted
            });
        }

        // Force restart is level-triggered: it holds the reveal at the start
        // for as long as the key is down.
        let restart_edge = self.actions.take_edge(Action::Restart);
        if self.actions.is_down(Action::Restart) {
            self.reveal.restart();
            if restart_edge {
                self.events.push(GameEvent::RevealRestarted);
            }
        }

        if self.actions.take_edge(Action::DurationUp) {
            self.nudge_duration(self.settings.duration_step);
        }
        if self.actions.take_edge(Action::DurationDown) {
            self.nudge_duration(-self.settings.duration_step);
        }

        if self.actions.take_edge(Action::Finish) {
            self.declare_win();
        }
    }

    fn image_changed(&mut self) {
        self.reveal.reset();
        let index = self.catalog.cursor();
        if let Ok(image) = self.catalog.current() {
            log::debug!("Image {} of {}: '{}' [{}]", index + 1, self.catalog.len(), image.name, image.category);
        }
        self.events.push(GameEvent::ImageChanged { index });
    }

    fn nudge_duration(&mut self, delta: f32) {
        let before = self.reveal.duration();
        self.reveal.set_duration(before + delta);
        let secs = self.reveal.duration();
        if secs != before {
            log::info!("Reveal duration {before:.1}s -> {secs:.1}s");
            self.events.push(GameEvent::DurationChanged { secs });
        }
    }

    fn set_mode(&mut self, to: GameMode) {
        let from = self.mode;
        if from == to {
            return;
        }
        self.mode = to;
        log::info!("Mode {from:?} -> {to:?}");
        self.events.push(GameEvent::ModeChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ImageAsset {
        ImageAsset { name: name.into(), category: "a".into(), data: vec![0] }
    }

    fn controller(n: usize) -> Controller {
        let images = (0..n).map(|i| asset(&format!("img{i}"))).collect();
        Controller::new(Catalog::new(images), Settings::default())
    }

    /// One frame: set which actions are held, process input, advance time.
    fn frame(c: &mut Controller, held: &[Action], dt: f32) {
        c.actions_mut().observe_all(|a| held.contains(&a));
        c.process_input();
        c.update(dt);
    }

    fn active(n: usize) -> Controller {
        let mut c = controller(n);
        frame(&mut c, &[Action::Confirm], 0.0);
        frame(&mut c, &[], 0.0);
        assert_eq!(c.mode(), GameMode::Active);
        c.drain_events();
        c
    }

    #[test]
    fn starts_in_menu() {
        let c = controller(2);
        assert_eq!(c.mode(), GameMode::Menu);
        assert!(matches!(c.frame(), Frame::Menu { lines } if lines == MENU_LINES));
    }

    #[test]
    fn held_confirm_enters_active_once() {
        let mut c = controller(2);
        for _ in 0..5 {
            frame(&mut c, &[Action::Confirm], 0.016);
        }
        assert_eq!(c.mode(), GameMode::Active);
        let modes: Vec<_> = c.drain_events().into_iter()
            .filter(|e| matches!(e, GameEvent::ModeChanged { .. }))
            .collect();
        assert_eq!(modes, vec![GameEvent::ModeChanged { from: GameMode::Menu, to: GameMode::Active }]);
    }

    #[test]
    fn navigation_resets_reveal() {
        let mut c = active(3);
        frame(&mut c, &[Action::TogglePause], 0.0);
        frame(&mut c, &[], 4.0);
        assert!(c.reveal().pixel_size() < 100.0);

        frame(&mut c, &[Action::Next], 0.0);
        assert_eq!(c.catalog().cursor(), 1);
        let r = c.reveal();
        assert!(r.is_paused());
        assert_eq!(r.elapsed(), 0.0);
        assert_eq!(r.pixel_size(), 100.0);
        assert_eq!(r.score(), 100);

        frame(&mut c, &[], 0.0);
        frame(&mut c, &[Action::Previous], 0.0);
        frame(&mut c, &[], 0.0);
        frame(&mut c, &[Action::Previous], 0.0);
        assert_eq!(c.catalog().cursor(), 2);
        assert!(c.reveal().is_paused());
    }

    #[test]
    fn held_arrow_moves_once() {
        let mut c = active(5);
        for _ in 0..10 {
            frame(&mut c, &[Action::Next], 0.016);
        }
        assert_eq!(c.catalog().cursor(), 1);
    }

    #[test]
    fn single_image_navigation_still_resets() {
        let mut c = active(1);
        frame(&mut c, &[Action::TogglePause], 0.0);
        frame(&mut c, &[], 3.0);
        frame(&mut c, &[Action::Next], 0.0);
        assert_eq!(c.catalog().cursor(), 0);
        assert_eq!(c.reveal().elapsed(), 0.0);
        assert!(c.reveal().is_paused());
    }

    #[test]
    fn toggle_pause_edges() {
        let mut c = active(2);
        assert!(c.reveal().is_paused());
        frame(&mut c, &[Action::TogglePause], 0.0);
        frame(&mut c, &[Action::TogglePause], 0.0);
        assert!(!c.reveal().is_paused(), "held key must not toggle twice");
        frame(&mut c, &[], 0.0);
        frame(&mut c, &[Action::TogglePause], 0.0);
        assert!(c.reveal().is_paused());
    }

    #[test]
    fn restart_is_level_triggered() {
        let mut c = active(2);
        frame(&mut c, &[Action::TogglePause], 0.0);
        frame(&mut c, &[], 5.0);
        frame(&mut c, &[Action::TogglePause], 0.0);
        assert!(c.reveal().is_paused());

        // Every held frame snaps back to the start and keeps it running.
        for _ in 0..3 {
            frame(&mut c, &[Action::Restart], 1.0);
            assert!(!c.reveal().is_paused());
            assert!((c.reveal().elapsed() - 1.0).abs() < 1e-6);
        }
        let restarts = c.drain_events().into_iter()
            .filter(|e| *e == GameEvent::RevealRestarted)
            .count();
        assert_eq!(restarts, 1);

        frame(&mut c, &[], 1.0);
        assert!((c.reveal().elapsed() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn answer_only_when_fully_revealed() {
        let mut c = active(2);
        frame(&mut c, &[Action::TogglePause], 0.0);
        frame(&mut c, &[], 9.0);
        match c.frame() {
            Frame::Active(f) => {
                assert!(f.answer.is_none());
                assert_eq!(f.position, 1);
                assert_eq!(f.total, 2);
            }
            other => panic!("unexpected frame {other:?}"),
        }

        frame(&mut c, &[], 1.5);
        assert!(c.drain_events().contains(&GameEvent::RevealCompleted));
        match c.frame() {
            Frame::Active(f) => {
                assert_eq!(f.pixel_size, 1.0);
                assert_eq!(f.score_text, "Score: 1");
                assert_eq!(f.answer.as_deref(), Some("ANSWER : img0"));
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn score_text_tracks_reveal() {
        let mut c = active(1);
        frame(&mut c, &[Action::TogglePause], 0.0);
        frame(&mut c, &[], 2.5);
        match c.frame() {
            Frame::Active(f) => {
                assert!((f.pixel_size - 75.25).abs() < 1e-3);
                assert_eq!(f.score_text, "Score: 94");
                assert!(!f.paused);
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn duration_nudges_are_clamped() {
        let mut c = active(1);
        for _ in 0..40 {
            frame(&mut c, &[Action::DurationUp], 0.0);
            frame(&mut c, &[], 0.0);
        }
        assert_eq!(c.reveal().duration(), 20.0);
        for _ in 0..60 {
            frame(&mut c, &[Action::DurationDown], 0.0);
            frame(&mut c, &[], 0.0);
        }
        assert_eq!(c.reveal().duration(), 1.0);
    }

    #[test]
    fn reveal_keeps_running_outside_active() {
        let mut c = active(2);
        frame(&mut c, &[Action::TogglePause], 0.0);
        assert!(c.declare_win());
        frame(&mut c, &[], 5.0);
        assert!((c.reveal().elapsed() - 5.0).abs() < 1e-6);

        // Back through the menu into Active: progress is still there.
        frame(&mut c, &[Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Menu);
        frame(&mut c, &[], 0.0);
        frame(&mut c, &[Action::Confirm], 2.5);
        assert_eq!(c.mode(), GameMode::Active);
        assert!((c.reveal().elapsed() - 7.5).abs() < 1e-6);
        assert!(c.reveal().pixel_size() < 100.0);
    }

    #[test]
    fn paused_reveal_stays_put_in_win() {
        let mut c = active(2);
        c.declare_win();
        frame(&mut c, &[], 5.0);
        assert_eq!(c.reveal().elapsed(), 0.0);
    }

    #[test]
    fn declare_win_only_from_active() {
        let mut c = controller(2);
        assert!(!c.declare_win());
        assert_eq!(c.mode(), GameMode::Menu);

        let mut c = active(2);
        assert!(c.declare_win());
        assert_eq!(c.mode(), GameMode::Win);
        assert!(matches!(c.frame(), Frame::Win { message } if message == WIN_MESSAGE));
        assert!(!c.declare_win());
    }

    #[test]
    fn finish_action_declares_win() {
        let mut c = active(2);
        frame(&mut c, &[Action::Finish], 0.0);
        assert_eq!(c.mode(), GameMode::Win);
    }

    #[test]
    fn win_confirm_edge_back_to_menu_once() {
        let mut c = active(2);
        c.declare_win();
        for _ in 0..5 {
            frame(&mut c, &[Action::Confirm], 0.0);
        }
        assert_eq!(c.mode(), GameMode::Menu, "held confirm must not run on into Active");
        frame(&mut c, &[], 0.0);
        frame(&mut c, &[Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Active);
    }

    #[test]
    fn win_confirm_edge_ignores_press_held_from_before() {
        let mut c = active(2);
        frame(&mut c, &[Action::Confirm], 0.0);
        c.declare_win();
        frame(&mut c, &[Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Win);
    }

    #[test]
    fn win_confirm_level_fires_on_held_press() {
        let settings = Settings { win_confirm: Trigger::Level, ..Settings::default() };
        let mut c = Controller::new(Catalog::new(vec![asset("a")]), settings);
        frame(&mut c, &[Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Active);
        c.declare_win();

        // Still held from the menu press: level trigger fires anyway…
        frame(&mut c, &[Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Menu);
        // …and marks it consumed, so the menu does not bounce straight back.
        frame(&mut c, &[Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Menu);
    }

    #[test]
    fn quit_from_menu_only() {
        let mut c = active(1);
        frame(&mut c, &[Action::Quit], 0.0);
        assert!(!c.quit_requested());

        let mut c = controller(1);
        frame(&mut c, &[Action::Quit], 0.0);
        assert!(c.quit_requested());
    }

    #[test]
    fn finish_key_held_into_menu_does_not_quit() {
        let mut c = active(1);
        frame(&mut c, &[Action::Finish, Action::Quit], 0.0);
        assert_eq!(c.mode(), GameMode::Win);
        frame(&mut c, &[Action::Finish, Action::Quit, Action::Confirm], 0.0);
        assert_eq!(c.mode(), GameMode::Menu);
        frame(&mut c, &[Action::Finish, Action::Quit], 0.0);
        assert!(!c.quit_requested());
    }

    #[test]
    fn empty_catalog_never_panics() {
        let mut c = active(0);
        frame(&mut c, &[Action::Next], 0.0);
        frame(&mut c, &[Action::Previous, Action::TogglePause], 1.0);
        frame(&mut c, &[Action::Restart], 1.0);
        assert_eq!(c.catalog().cursor(), 0);
        assert!(matches!(c.frame(), Frame::NoImages));
        assert!(!c.drain_events().iter().any(|e| matches!(e, GameEvent::ImageChanged { .. })));
    }
}
