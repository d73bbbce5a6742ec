//! Motion remote input read from the kernel event device through `evdev`.
//!
//! The worker thread blocks on the device, normalizes what it reads and
//! pushes the resulting actions into the frame loop's queue. It never
//! touches menu state itself.

use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use evdev::{AbsoluteAxisCode, Device, EventType, InputEvent};
use tracing::{debug, info, warn};

use crate::config::DeviceConfig;
use crate::error::DeviceError;
use crate::frame::ActionSender;
use crate::input::{Axis, InputNormalizer, RawEvent};

const EV_KEY: u16 = EventType::KEY.0;
const EV_ABS: u16 = EventType::ABSOLUTE.0;
const ABS_RX: u16 = AbsoluteAxisCode::ABS_RX.0;
const ABS_RY: u16 = AbsoluteAxisCode::ABS_RY.0;

/// The parts of an `InputEvent` the menu cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl From<InputEvent> for KernelEvent {
    fn from(ev: InputEvent) -> Self {
        Self {
            kind: ev.event_type().0,
            code: ev.code(),
            value: ev.value(),
        }
    }
}

pub fn translate(ev: KernelEvent, device: &DeviceConfig) -> Option<RawEvent> {
    match (ev.kind, ev.code) {
        (EV_ABS, ABS_RX) => Some(RawEvent::AxisSample {
            axis: Axis::X,
            value: ev.value,
        }),
        (EV_ABS, ABS_RY) => Some(RawEvent::AxisSample {
            axis: Axis::Y,
            value: ev.value,
        }),
        // presses only; releases and autorepeat are dropped
        (EV_KEY, code) if ev.value == 1 => device.button_for(code).map(RawEvent::Button),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
}

/// First candidate, by path, whose name contains one of `patterns`.
pub fn find_device(
    candidates: impl IntoIterator<Item = (PathBuf, String)>,
    patterns: &[String],
) -> Result<DeviceInfo, DeviceError> {
    let mut candidates: Vec<(PathBuf, String)> = candidates.into_iter().collect();
    candidates.sort();
    for (path, name) in candidates {
        debug!("input device {}: {}", path.display(), name);
        if patterns.iter().any(|p| name.contains(p.as_str())) {
            return Ok(DeviceInfo { path, name });
        }
    }
    Err(DeviceError::NotFound(patterns.to_vec()))
}

pub fn locate(patterns: &[String]) -> Result<DeviceInfo, DeviceError> {
    let devices = evdev::enumerate()
        .map(|(path, dev)| (path, dev.name().unwrap_or_default().to_string()));
    find_device(devices, patterns)
}

/// Read event batches until the source fails or the queue is dropped.
pub fn read_loop<F, I>(mut fetch: F, device: &DeviceConfig, tx: &ActionSender)
where
    F: FnMut() -> io::Result<I>,
    I: IntoIterator<Item = KernelEvent>,
{
    let normalizer = InputNormalizer::new(device.calibration());
    loop {
        let events = match fetch() {
            Ok(events) => events,
            Err(e) => {
                if e.kind() == ErrorKind::UnexpectedEof {
                    info!("input device closed");
                } else {
                    warn!("input device read failed: {}", e);
                }
                return;
            }
        };
        for ev in events {
            let Some(action) = translate(ev, device).and_then(|raw| normalizer.normalize(raw))
            else {
                continue;
            };
            if !tx.send(action) {
                return;
            }
        }
    }
}

pub fn spawn_worker(
    info: DeviceInfo,
    device: DeviceConfig,
    tx: ActionSender,
) -> Result<JoinHandle<()>, DeviceError> {
    let mut dev = Device::open(&info.path).map_err(|source| DeviceError::Open {
        path: info.path.clone(),
        source,
    })?;
    info!("Remote connected on {} ({})", info.path.display(), info.name);
    Ok(thread::spawn(move || {
        let fetch = || {
            dev.fetch_events()
                .map(|events| events.map(KernelEvent::from).collect::<Vec<_>>())
        };
        read_loop(fetch, &device, &tx)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::action_queue;
    use crate::input::MenuAction;
    use evdev::KeyCode;
    use std::collections::VecDeque;

    fn ev(kind: u16, code: u16, value: i32) -> KernelEvent {
        KernelEvent { kind, code, value }
    }

    #[test]
    fn translates_axes_and_mapped_presses() {
        let d = DeviceConfig::default();
        let btn_a = KeyCode::BTN_SOUTH.code();
        assert_eq!(
            translate(ev(EV_ABS, ABS_RX, 200), &d),
            Some(RawEvent::AxisSample { axis: Axis::X, value: 200 })
        );
        assert_eq!(translate(ev(EV_KEY, btn_a, 1), &d), Some(RawEvent::Button(0)));
        assert_eq!(translate(ev(EV_KEY, btn_a, 0), &d), None);
        assert_eq!(translate(ev(EV_KEY, btn_a, 2), &d), None);
        assert_eq!(translate(ev(EV_KEY, KeyCode::BTN_TL.code(), 1), &d), None);
        // ABS_X is not pointer motion on the remote
        assert_eq!(translate(ev(EV_ABS, AbsoluteAxisCode::ABS_X.0, 200), &d), None);
    }

    #[test]
    fn kernel_event_keeps_type_code_and_value() {
        let raw = InputEvent::new(EV_ABS, ABS_RY, -42);
        assert_eq!(KernelEvent::from(raw), ev(EV_ABS, ABS_RY, -42));
    }

    #[test]
    fn read_loop_forwards_in_order_until_the_device_closes() {
        let mut batches: VecDeque<Vec<KernelEvent>> = VecDeque::from(vec![
            vec![ev(EV_ABS, ABS_RX, 178), ev(EventType::SYNCHRONIZATION.0, 0, 0)],
            vec![
                ev(EV_ABS, ABS_RY, 98),
                ev(EV_KEY, KeyCode::BTN_EAST.code(), 1),
                ev(EV_KEY, KeyCode::BTN_EAST.code(), 0),
            ],
            vec![ev(EV_KEY, KeyCode::BTN_MODE.code(), 1)],
        ]);
        let fetch = || {
            batches
                .pop_front()
                .ok_or_else(|| io::Error::new(ErrorKind::UnexpectedEof, "gone"))
        };

        let (sender, queue) = action_queue();
        read_loop(fetch, &DeviceConfig::default(), &sender);
        assert_eq!(
            queue.drain(),
            vec![
                MenuAction::MoveCursor(5, 0),
                MenuAction::MoveCursor(0, -3),
                MenuAction::Back,
                MenuAction::OpenSettings,
            ]
        );
    }

    #[test]
    fn read_loop_stops_when_the_queue_is_gone() {
        let (sender, queue) = action_queue();
        drop(queue);
        let mut calls = 0;
        let fetch = || {
            calls += 1;
            Ok::<_, io::Error>(vec![ev(EV_KEY, KeyCode::BTN_SOUTH.code(), 1)])
        };
        read_loop(fetch, &DeviceConfig::default(), &sender);
        assert_eq!(calls, 1);
    }

    #[test]
    fn finds_device_by_name() {
        let candidates = vec![
            (PathBuf::from("/dev/input/event3"), "Nintendo Wii Remote".to_string()),
            (PathBuf::from("/dev/input/event0"), "AT Translated Keyboard".to_string()),
            (PathBuf::from("/dev/input/event5"), "Nintendo Wii Remote IR".to_string()),
        ];
        let found = find_device(candidates.clone(), &DeviceConfig::default().names).unwrap();
        assert_eq!(found.name, "Nintendo Wii Remote");
        assert_eq!(found.path, PathBuf::from("/dev/input/event3"));

        let missing = find_device(candidates, &["Balance Board".to_string()]);
        assert!(matches!(missing, Err(DeviceError::NotFound(_))));
    }
}
