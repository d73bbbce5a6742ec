//! Per-frame driver: drain queued actions, apply them, dispatch launches,
//! then advance animation.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::info;

use crate::input::MenuAction;
use crate::launch::{LaunchDispatcher, ProcessRunner};
use crate::menu::{Effect, MenuMachine};

/// Producer half of the action queue. Cloned into the device worker.
#[derive(Clone, Debug)]
pub struct ActionSender(Sender<MenuAction>);

impl ActionSender {
    /// Returns false once the frame loop is gone.
    pub fn send(&self, action: MenuAction) -> bool {
        self.0.send(action).is_ok()
    }
}

/// Consumer half, owned by the frame loop.
pub struct ActionQueue(Receiver<MenuAction>);

impl ActionQueue {
    pub(crate) fn drain(&self) -> Vec<MenuAction> {
        self.0.try_iter().collect()
    }
}

pub fn action_queue() -> (ActionSender, ActionQueue) {
    let (tx, rx) = mpsc::channel::<MenuAction>();
    (ActionSender(tx), ActionQueue(rx))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Launched,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Control {
    #[default]
    Continue,
    Exit(ExitReason),
}

#[derive(Debug, Default)]
pub struct FrameReport {
    pub control: Control,
    pub settings_requested: bool,
    /// Transient message for the on-screen overlay.
    pub notice: Option<String>,
    /// Actions queued behind `OpenSettings`; they belong to the settings overlay.
    pub pending: Vec<MenuAction>,
}

pub struct FrameLoop<R> {
    machine: MenuMachine,
    dispatcher: LaunchDispatcher<R>,
    queue: ActionQueue,
}

impl<R: ProcessRunner> FrameLoop<R> {
    pub fn new(machine: MenuMachine, dispatcher: LaunchDispatcher<R>, queue: ActionQueue) -> Self {
        Self {
            machine,
            dispatcher,
            queue,
        }
    }

    pub fn machine(&self) -> &MenuMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut MenuMachine {
        &mut self.machine
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &LaunchDispatcher<R> {
        &self.dispatcher
    }

    pub fn tick(&mut self, dt: f32) -> FrameReport {
        let mut report = FrameReport::default();
        if self.machine.quit_requested() {
            report.control = Control::Exit(ExitReason::Quit);
            return report;
        }

        let mut actions = self.take_pending().into_iter();
        while let Some(action) = actions.next() {
            match self.machine.apply(action) {
                Effect::None => {}
                Effect::OpenSettings => {
                    report.settings_requested = true;
                    report.pending = actions.by_ref().collect();
                    break;
                }
                Effect::Quit => {
                    info!("quit requested");
                    report.control = Control::Exit(ExitReason::Quit);
                    return report;
                }
                Effect::Launch(game) => match self.dispatcher.launch(&game) {
                    Ok(()) => {
                        report.control = Control::Exit(ExitReason::Launched);
                        return report;
                    }
                    Err(e) => {
                        self.machine.launch_failed();
                        report.notice = Some(format!("Could not start {}: {}", game.title, e));
                    }
                },
            }
        }

        self.animate(dt);
        report
    }

    /// Drain queued actions without applying them, for an overlay that owns input.
    pub fn take_pending(&mut self) -> Vec<MenuAction> {
        self.queue.drain()
    }

    pub fn animate(&mut self, dt: f32) {
        self.machine.update(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Direction;
    use crate::launch::testing::RecordingRunner;
    use crate::layout::GridLayout;
    use crate::menu::{Cursor, MenuState};
    use crate::model::{Folder, Game, Item};

    fn games(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| {
                Item::Game(Game {
                    title: format!("Game {}", i),
                    path: format!("/roms/gba/game{}.gba", i),
                    emulator: "mgba-qt -f".into(),
                })
            })
            .collect()
    }

    fn frame_loop(root: Vec<Item>, runner: RecordingRunner) -> (ActionSender, FrameLoop<RecordingRunner>) {
        let (tx, rx) = action_queue();
        let machine = MenuMachine::new(root, GridLayout::default(), 4, Cursor::new(1920, 1080, 32, 32));
        (tx, FrameLoop::new(machine, LaunchDispatcher::new(runner), rx))
    }

    #[test]
    fn activating_a_game_runs_it_once_and_ends_the_loop() {
        let (tx, mut fl) = frame_loop(games(12), RecordingRunner::default());
        tx.send(MenuAction::Step(Direction::Right));
        tx.send(MenuAction::Step(Direction::Down));
        for _ in 0..4 {
            tx.send(MenuAction::Activate);
        }
        let report = fl.tick(0.016);
        assert_eq!(report.control, Control::Exit(ExitReason::Launched));
        assert_eq!(
            fl.dispatcher().runner().calls,
            vec![("mgba-qt -f".to_string(), "/roms/gba/game5.gba".to_string())]
        );
    }

    #[test]
    fn failed_launch_is_recoverable() {
        let runner = RecordingRunner {
            fail: true,
            ..Default::default()
        };
        let (tx, mut fl) = frame_loop(games(3), runner);
        tx.send(MenuAction::Activate);
        let report = fl.tick(0.016);
        assert_eq!(report.control, Control::Continue);
        assert!(report.notice.is_some());
        assert_eq!(fl.machine().state(), MenuState::Root);

        tx.send(MenuAction::Activate);
        fl.tick(0.016);
        assert_eq!(fl.dispatcher().runner().calls.len(), 2);
    }

    #[test]
    fn quit_aborts_pending_launches() {
        let (tx, mut fl) = frame_loop(games(3), RecordingRunner::default());
        tx.send(MenuAction::Quit);
        tx.send(MenuAction::Activate);
        assert_eq!(fl.tick(0.016).control, Control::Exit(ExitReason::Quit));
        tx.send(MenuAction::Activate);
        assert_eq!(fl.tick(0.016).control, Control::Exit(ExitReason::Quit));
        assert!(fl.dispatcher().runner().calls.is_empty());
    }

    #[test]
    fn input_is_applied_before_animation() {
        let mut sports = Folder::new("Sports");
        sports.children = games(2);
        let (tx, mut fl) = frame_loop(vec![Item::Folder(sports)], RecordingRunner::default());
        tx.send(MenuAction::Activate);
        fl.tick(1.0);
        // the folder's children were laid out and fully advanced in the same frame
        let m = fl.machine();
        assert_eq!(m.items().len(), 2);
        assert!(m.transforms().iter().all(|t| t.settled(1e-3)));
    }

    #[test]
    fn actions_from_another_thread_keep_their_order() {
        let (tx, mut fl) = frame_loop(games(8), RecordingRunner::default());
        let worker = std::thread::spawn(move || {
            tx.send(MenuAction::Step(Direction::Down));
            tx.send(MenuAction::Step(Direction::Right));
            tx.send(MenuAction::Step(Direction::Right));
            tx.send(MenuAction::Step(Direction::Up));
        });
        worker.join().unwrap();
        fl.tick(0.016);
        assert_eq!(fl.machine().selection(), 2);
    }

    #[test]
    fn settings_request_is_reported() {
        let (tx, mut fl) = frame_loop(games(1), RecordingRunner::default());
        tx.send(MenuAction::OpenSettings);
        let report = fl.tick(0.016);
        assert!(report.settings_requested);
        assert_eq!(report.control, Control::Continue);
        assert!(report.pending.is_empty());
    }

    #[test]
    fn actions_behind_open_settings_are_handed_back() {
        let (tx, mut fl) = frame_loop(games(3), RecordingRunner::default());
        tx.send(MenuAction::OpenSettings);
        tx.send(MenuAction::Activate);
        tx.send(MenuAction::Step(Direction::Down));
        let report = fl.tick(0.016);
        assert!(report.settings_requested);
        assert_eq!(report.control, Control::Continue);
        assert_eq!(
            report.pending,
            vec![MenuAction::Activate, MenuAction::Step(Direction::Down)]
        );
        assert!(fl.dispatcher().runner().calls.is_empty());
        assert_eq!(fl.machine().state(), MenuState::Root);
    }
}
