use sdl2::controller::Axis as CAxis;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::render::BlendMode;
use sdl2::ttf::Sdl2TtfContext;
use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod anim;
mod config;
mod device;
mod error;
mod frame;
mod input;
mod launch;
mod layout;
mod menu;
mod model;
mod scan;
mod ui;

use anim::Vec2;
use config::ConfigFile;
use frame::{Control, FrameLoop};
use input::{
    Axis, Calibration, InputNormalizer, MenuAction, RawEvent, BUTTON_ACTIVATE, BUTTON_BACK,
};
use launch::{CommandRunner, LaunchDispatcher};
use layout::GridLayout;
use menu::{Cursor, MenuMachine};
use ui::{Overlay, OverlayKey, OverlayOutcome, UIColors};

const CURSOR_SIZE: i32 = 32;
const FONT_SIZE: u16 = 18;
/// Controller stick deflection per pixel of pointer motion.
const STICK_DIVISOR: i32 = 2000;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rpi_launcher_menu=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Grid sized so `rows` rows fit below the banner, centered horizontally.
fn grid_for(config: &ConfigFile, w: i32, h: i32) -> GridLayout {
    let defaults = GridLayout::default();
    let layout = config.layout.clone().unwrap_or_default();
    let mut grid = GridLayout {
        origin: Vec2::new(0.0, (ui::BANNER_H + 20) as f32),
        icon_size: layout.icon_size.unwrap_or(defaults.icon_size),
        padding: layout.padding.unwrap_or(defaults.padding),
        label_padding: layout.label_padding.unwrap_or(defaults.label_padding),
    };
    let avail_h = h as f32 - grid.origin.y;
    let fit = avail_h / config.rows() as f32 - grid.padding - grid.label_padding;
    if fit >= 16.0 && fit < grid.icon_size {
        grid.icon_size = fit;
    }
    grid.centered(w, config.columns())
}

fn find_font(config: &ConfigFile) -> Option<String> {
    // font path preference order: config.font_path -> FONT_PATH env -> common system fonts
    config
        .font_path
        .clone()
        .or_else(|| env::var("FONT_PATH").ok())
        .or_else(|| {
            let candidates = [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            ];
            candidates
                .iter()
                .find(|p| Path::new(p).exists())
                .map(|s| s.to_string())
        })
}

fn save_config(path: Option<&Path>, config: &ConfigFile) -> String {
    match path {
        Some(p) => match config::write_config_to(p, config) {
            Ok(()) => {
                info!("Saved config to {}", p.display());
                "Config saved".to_string()
            }
            Err(e) => {
                warn!("{}", e);
                format!("Save failed: {}", e)
            }
        },
        None => error::ConfigError::NoPath.to_string(),
    }
}

fn main() -> Result<(), String> {
    init_logging();

    let config_path: Option<PathBuf> = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(config::user_config_path);
    let mut config = match &config_path {
        Some(p) => config::load_config_from(p),
        None => config::load_config(),
    };

    let games = scan::scan_all(config.platforms.as_deref().unwrap_or(&[]));
    let root = scan::arrange(games, config.folders.as_deref().unwrap_or(&[]));
    if root.is_empty() {
        warn!(
            "No games found. Check the platforms in {}",
            config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "~/.config/rpi_launcher_menu/config.toml".to_string())
        );
    }
    info!("{} items at the root", root.len());

    let sdl_ctx = sdl2::init()?;
    let video = sdl_ctx.video()?;
    let joystick_subsystem = sdl_ctx.joystick()?;
    let controller_subsystem = sdl_ctx.game_controller()?;

    let display_mode = video.desktop_display_mode(0)?;
    let (w, h) = (display_mode.w, display_mode.h);

    let window = video
        .window("Launcher", w as u32, h as u32)
        .position_centered()
        .fullscreen_desktop()
        .build()
        .map_err(|e| e.to_string())?;

    let mut canvas = window
        .into_canvas()
        .accelerated()
        .present_vsync()
        .build()
        .map_err(|e| e.to_string())?;
    canvas.set_blend_mode(BlendMode::Blend);
    let texture_creator = canvas.texture_creator();

    let ttf_ctx: Sdl2TtfContext = sdl2::ttf::init().map_err(|e| e.to_string())?;
    let font_path = find_font(&config).ok_or_else(|| {
        "No TTF font found. Set font_path in config or install DejaVu/FreeSans or set FONT_PATH."
            .to_string()
    })?;
    let font = ttf_ctx
        .load_font(&font_path, FONT_SIZE)
        .map_err(|e| e.to_string())?;

    // Opened devices must stay alive to keep delivering events.
    let mut controllers = Vec::new();
    let mut joysticks = Vec::new();
    for id in 0..joystick_subsystem.num_joysticks()? {
        if controller_subsystem.is_game_controller(id) {
            match controller_subsystem.open(id) {
                Ok(gc) => {
                    info!("Opened controller: {}", gc.name());
                    controllers.push(gc);
                }
                Err(e) => warn!("Failed opening controller {}: {}", id, e),
            }
        } else {
            match joystick_subsystem.open(id) {
                Ok(js) => {
                    info!("Opened joystick: {}", js.name());
                    joysticks.push(js);
                }
                Err(e) => warn!("Failed opening joystick {}: {}", id, e),
            }
        }
    }
    let joystick_ids: Vec<u32> = joysticks.iter().map(|js| js.instance_id()).collect();

    sdl_ctx.mouse().set_relative_mouse_mode(true);
    video.text_input().stop();

    let colors = UIColors::from_theme(config.theme_color());
    let grid = grid_for(&config, w, h);
    let cursor = Cursor::new(w, h, CURSOR_SIZE, CURSOR_SIZE);
    let machine = MenuMachine::new(root, grid, config.columns(), cursor);

    let (tx, queue) = frame::action_queue();
    let mut frame_loop = FrameLoop::new(machine, LaunchDispatcher::new(CommandRunner), queue);

    let mut notice: Option<(String, Instant)> = None;
    let device_cfg = config.device();
    let worker = device::locate(&device_cfg.names)
        .and_then(|info| device::spawn_worker(info, device_cfg.clone(), tx.clone()));
    if let Err(e) = worker {
        warn!("{}; pointer and keyboard still work", e);
        notice = Some((e.to_string(), Instant::now()));
    }

    let normalizer = InputNormalizer::default();
    let stick = InputNormalizer::new(Calibration {
        center: 0,
        divisor: STICK_DIVISOR,
    });

    let mut event_pump = sdl_ctx.event_pump()?;
    let mut overlay = Overlay::Closed;
    let mut last = Instant::now();

    'running: loop {
        for event in event_pump.poll_iter() {
            // prompt editing and Escape bypass the queue; Escape must not turn into Quit
            if overlay.is_open() {
                let key = match &event {
                    Event::TextInput { text, .. } if overlay.wants_text() => {
                        Some(OverlayKey::Text(text.clone()))
                    }
                    Event::KeyDown {
                        keycode: Some(Keycode::Backspace),
                        ..
                    } if overlay.wants_text() => Some(OverlayKey::Erase),
                    Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => Some(OverlayKey::Cancel),
                    _ => None,
                };
                if let Some(key) = key {
                    overlay.handle(key);
                    continue;
                }
            }

            let action = match event {
                Event::Quit { .. } => Some(MenuAction::Quit),
                Event::MouseMotion { xrel, yrel, .. } => {
                    normalizer.normalize(RawEvent::PointerDelta { dx: xrel, dy: yrel })
                }
                Event::MouseButtonDown { mouse_btn, .. } => match mouse_btn {
                    MouseButton::Left => normalizer.normalize(RawEvent::Button(BUTTON_ACTIVATE)),
                    MouseButton::Right => normalizer.normalize(RawEvent::Button(BUTTON_BACK)),
                    _ => None,
                },
                Event::KeyDown {
                    keycode: Some(k),
                    repeat: false,
                    ..
                } => normalizer.normalize(RawEvent::Key(k)),
                Event::ControllerButtonDown { button, .. } => {
                    normalizer.normalize(RawEvent::Controller(button))
                }
                Event::ControllerAxisMotion { axis, value, .. } => {
                    let axis = match axis {
                        CAxis::LeftX => Some(Axis::X),
                        CAxis::LeftY => Some(Axis::Y),
                        _ => None,
                    };
                    axis.and_then(|axis| {
                        stick.normalize(RawEvent::AxisSample {
                            axis,
                            value: value as i32,
                        })
                    })
                }
                Event::JoyButtonDown {
                    which, button_idx, ..
                } if joystick_ids.contains(&which) => {
                    normalizer.normalize(RawEvent::Button(button_idx as u32))
                }
                _ => None,
            };
            if let Some(action) = action {
                tx.send(action);
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let overlay_actions = if overlay.is_open() {
            let actions = frame_loop.take_pending();
            frame_loop.animate(dt);
            actions
        } else {
            let report = frame_loop.tick(dt);
            if let Some(msg) = report.notice {
                notice = Some((msg, Instant::now()));
            }
            if let Control::Exit(reason) = report.control {
                info!(?reason, state = ?frame_loop.machine().state(), "leaving menu");
                break 'running;
            }
            if report.settings_requested {
                overlay = Overlay::settings();
            }
            report.pending
        };

        for action in overlay_actions {
            match overlay.handle_action(action) {
                OverlayOutcome::Stay => {}
                OverlayOutcome::SaveConfig => {
                    notice = Some((save_config(config_path.as_deref(), &config), Instant::now()));
                }
                OverlayOutcome::CreateFolder(name) => {
                    let parents = frame_loop.machine().view_folder_slots();
                    if frame_loop.machine_mut().create_folder(&name).is_some() {
                        let msg = if config.record_folder(&parents, &name) {
                            let saved = save_config(config_path.as_deref(), &config);
                            format!("Created folder {}. {}", name, saved)
                        } else {
                            warn!("folder {} has no place in the saved folder tree", name);
                            format!("Created folder {} (not saved)", name)
                        };
                        notice = Some((msg, Instant::now()));
                    }
                }
                OverlayOutcome::Exit => {
                    info!("exit from settings");
                    break 'running;
                }
            }
        }

        let text_input = video.text_input();
        if overlay.wants_text() != text_input.is_active() {
            if overlay.wants_text() {
                text_input.start();
            } else {
                text_input.stop();
            }
        }

        ui::render_frame(
            &mut canvas,
            &texture_creator,
            &font,
            &colors,
            frame_loop.machine(),
            w,
            h,
        );
        ui::render_overlay(&mut canvas, &texture_creator, &font, &colors, &overlay, w, h);
        ui::render_notice(&mut canvas, &texture_creator, &font, &colors, &mut notice, w, h);
        canvas.present();

        std::thread::sleep(Duration::from_millis(16));
    }

    Ok(())
}
