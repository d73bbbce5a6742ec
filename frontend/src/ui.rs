use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::{TextureCreator, WindowCanvas};
use sdl2::ttf::Font;
use sdl2::video::WindowContext;
use std::time::Instant;

use crate::input::{Direction, MenuAction};
use crate::menu::MenuMachine;

pub const BANNER_H: i32 = 40;
const NOTICE_SECS: u64 = 3;
const NAME_MAX_CHARS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsItem {
    CreateFolder,
    SaveConfig,
    Close,
    Exit,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 4] = [
        SettingsItem::CreateFolder,
        SettingsItem::SaveConfig,
        SettingsItem::Close,
        SettingsItem::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsItem::CreateFolder => "Create folder",
            SettingsItem::SaveConfig => "Save config",
            SettingsItem::Close => "Close",
            SettingsItem::Exit => "Exit",
        }
    }
}

/// Modal layer drawn over the grid. While open it owns all input except `Quit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Overlay {
    Closed,
    Settings { selected: usize },
    Prompt { text: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayKey {
    Up,
    Down,
    Confirm,
    Cancel,
    Erase,
    Text(String),
}

impl OverlayKey {
    pub fn from_action(action: MenuAction) -> Option<Self> {
        match action {
            MenuAction::Step(Direction::Up) => Some(OverlayKey::Up),
            MenuAction::Step(Direction::Down) => Some(OverlayKey::Down),
            MenuAction::Activate => Some(OverlayKey::Confirm),
            MenuAction::Back => Some(OverlayKey::Cancel),
            _ => None,
        }
    }
}

/// Work the host has to do after the overlay handled a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayOutcome {
    Stay,
    CreateFolder(String),
    SaveConfig,
    Exit,
}

impl Overlay {
    pub fn settings() -> Self {
        Overlay::Settings { selected: 0 }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Overlay::Closed)
    }

    pub fn wants_text(&self) -> bool {
        matches!(self, Overlay::Prompt { .. })
    }

    /// Feed a queued menu action. `Quit` closes the overlay and ends the loop.
    pub fn handle_action(&mut self, action: MenuAction) -> OverlayOutcome {
        if action == MenuAction::Quit {
            *self = Overlay::Closed;
            return OverlayOutcome::Exit;
        }
        match OverlayKey::from_action(action) {
            Some(key) => self.handle(key),
            None => OverlayOutcome::Stay,
        }
    }

    pub fn handle(&mut self, key: OverlayKey) -> OverlayOutcome {
        match std::mem::replace(self, Overlay::Closed) {
            Overlay::Closed => OverlayOutcome::Stay,
            Overlay::Settings { mut selected } => {
                let last = SettingsItem::ALL.len() - 1;
                match key {
                    OverlayKey::Up => selected = selected.saturating_sub(1),
                    OverlayKey::Down => selected = (selected + 1).min(last),
                    OverlayKey::Cancel => return OverlayOutcome::Stay,
                    OverlayKey::Confirm => match SettingsItem::ALL[selected.min(last)] {
                        SettingsItem::CreateFolder => {
                            *self = Overlay::Prompt {
                                text: String::new(),
                            };
                            return OverlayOutcome::Stay;
                        }
                        SettingsItem::SaveConfig => {
                            *self = Overlay::Settings { selected };
                            return OverlayOutcome::SaveConfig;
                        }
                        SettingsItem::Close => return OverlayOutcome::Stay,
                        SettingsItem::Exit => return OverlayOutcome::Exit,
                    },
                    OverlayKey::Erase | OverlayKey::Text(_) => {}
                }
                *self = Overlay::Settings { selected };
                OverlayOutcome::Stay
            }
            Overlay::Prompt { mut text } => {
                match key {
                    OverlayKey::Cancel => return OverlayOutcome::Stay,
                    OverlayKey::Confirm => {
                        let name = text.trim();
                        if !name.is_empty() {
                            return OverlayOutcome::CreateFolder(name.to_string());
                        }
                    }
                    OverlayKey::Erase => {
                        text.pop();
                    }
                    OverlayKey::Text(s) => {
                        let room = NAME_MAX_CHARS.saturating_sub(text.chars().count());
                        text.extend(s.chars().filter(|c| !c.is_control()).take(room));
                    }
                    OverlayKey::Up | OverlayKey::Down => {}
                }
                *self = Overlay::Prompt { text };
                OverlayOutcome::Stay
            }
        }
    }
}

pub struct UIColors {
    pub bg: Color,
    pub tile_game: Color,
    pub tile_folder: Color,
    pub folder_tab: Color,
    pub highlight: Color,
    pub text_primary: Color,
    pub banner_bg: Color,
    pub banner_text: Color,
    pub cursor: Color,
    pub overlay_rgba: Color,
}

impl UIColors {
    pub fn from_theme(theme: [u8; 3]) -> Self {
        let [r, g, b] = theme;
        Self {
            bg: Color::RGB(r, g, b),
            tile_game: Color::RGB(235, 235, 235),
            tile_folder: Color::RGB(200, 200, 200),
            folder_tab: Color::RGB(160, 160, 160),
            highlight: Color::RGB(200, 180, 50),
            text_primary: Color::RGB(240, 240, 240),
            banner_bg: Color::RGB(20, 20, 20),
            banner_text: Color::RGB(220, 220, 220),
            cursor: Color::RGB(220, 30, 30),
            overlay_rgba: Color::RGBA(0, 0, 0, 200),
        }
    }
}

/// Shorten to `max_chars`, keeping both ends.
pub fn elide_middle(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }
    let keep = (max_chars - 3) / 2;
    let head = keep + ((max_chars - 3) % 2);
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - keep..].iter().collect();
    format!("{}...{}", start, end)
}

fn draw_text(
    canvas: &mut WindowCanvas,
    texture_creator: &TextureCreator<WindowContext>,
    font: &Font,
    text: &str,
    color: Color,
    x: i32,
    y: i32,
) {
    if text.is_empty() {
        return;
    }
    if let Ok(surf) = font.render(text).blended(color) {
        if let Ok(tex) = texture_creator.create_texture_from_surface(&surf) {
            let q = tex.query();
            let _ = canvas.copy(&tex, None, Rect::new(x, y, q.width, q.height));
        }
    }
}

fn text_width(font: &Font, text: &str) -> i32 {
    font.size_of(text).map(|(w, _)| w as i32).unwrap_or(0)
}

/// Render the icon grid, banner and pointer cursor.
pub fn render_frame(
    canvas: &mut WindowCanvas,
    texture_creator: &TextureCreator<WindowContext>,
    font: &Font,
    colors: &UIColors,
    machine: &MenuMachine,
    w: i32,
    h: i32,
) {
    canvas.set_draw_color(colors.bg);
    canvas.clear();

    let grid = machine.grid();
    let targeted = machine.targeted();
    let label_chars = ((grid.col_pitch() / 7.0) as usize).max(8);

    for (i, (item, t)) in machine
        .items()
        .iter()
        .zip(machine.transforms())
        .enumerate()
    {
        let (top_left, size) = grid.bounds(t);
        if size < 1.0 {
            continue;
        }
        let (x, y, side) = (top_left.x as i32, top_left.y as i32, size as u32);

        if targeted == Some(i) {
            canvas.set_draw_color(colors.highlight);
            let _ = canvas.fill_rect(Rect::new(x - 6, y - 6, side + 12, side + 12));
        }
        if item.is_folder() {
            canvas.set_draw_color(colors.folder_tab);
            let _ = canvas.fill_rect(Rect::new(x, y - side as i32 / 10, side / 2, side / 10 + 1));
            canvas.set_draw_color(colors.tile_folder);
        } else {
            canvas.set_draw_color(colors.tile_game);
        }
        let _ = canvas.fill_rect(Rect::new(x, y, side, side));

        // labels appear once the icon has mostly grown in
        if t.scale > 0.5 {
            let label = elide_middle(item.title(), label_chars);
            let lx = (t.pos.x + grid.icon_size / 2.0) as i32 - text_width(font, &label) / 2;
            let ly = (t.pos.y + grid.icon_size) as i32 + 6;
            draw_text(canvas, texture_creator, font, &label, colors.text_primary, lx, ly);
        }
    }

    if machine.items().is_empty() {
        let msg = "Nothing here";
        let x = (w - text_width(font, msg)) / 2;
        draw_text(canvas, texture_creator, font, msg, colors.text_primary, x, h / 2);
    }

    // banner
    canvas.set_draw_color(colors.banner_bg);
    let _ = canvas.fill_rect(Rect::new(0, 0, w as u32, BANNER_H as u32));

    let mut path = vec!["Home".to_string()];
    path.extend(machine.view_titles());
    draw_text(canvas, texture_creator, font, &path.join(" / "), colors.banner_text, 12, 10);

    let count = format!("{} items", machine.items().len());
    let cx = w - text_width(font, &count) - 12;
    draw_text(canvas, texture_creator, font, &count, colors.banner_text, cx, 10);

    let c = machine.cursor();
    canvas.set_draw_color(colors.cursor);
    let _ = canvas.fill_rect(Rect::new(c.x, c.y, c.w.max(1) as u32, c.h.max(1) as u32));
}

/// Bottom bar message, cleared after a few seconds.
pub fn render_notice(
    canvas: &mut WindowCanvas,
    texture_creator: &TextureCreator<WindowContext>,
    font: &Font,
    colors: &UIColors,
    notice: &mut Option<(String, Instant)>,
    w: i32,
    h: i32,
) {
    if let Some((msg, when)) = notice {
        if when.elapsed().as_secs() < NOTICE_SECS {
            canvas.set_draw_color(colors.overlay_rgba);
            let _ = canvas.fill_rect(Rect::new(0, h - 60, w as u32, 60));
            draw_text(canvas, texture_creator, font, msg, colors.text_primary, 12, h - 48);
        } else {
            *notice = None;
        }
    }
}

pub fn render_overlay(
    canvas: &mut WindowCanvas,
    texture_creator: &TextureCreator<WindowContext>,
    font: &Font,
    colors: &UIColors,
    overlay: &Overlay,
    w: i32,
    h: i32,
) {
    let menu_box_c = Color::RGB(40, 40, 40);
    let menu_selected_c = Color::RGB(80, 80, 80);
    let menu_text_c = Color::RGB(220, 220, 220);

    match overlay {
        Overlay::Closed => {}
        Overlay::Settings { selected } => {
            canvas.set_draw_color(colors.overlay_rgba);
            let _ = canvas.fill_rect(Rect::new(0, 0, w as u32, h as u32));

            let box_w = w / 2;
            let box_h = SettingsItem::ALL.len() as i32 * 28 + 48;
            let box_x = (w - box_w) / 2;
            let box_y = (h - box_h) / 2;
            canvas.set_draw_color(menu_box_c);
            let _ = canvas.fill_rect(Rect::new(box_x, box_y, box_w as u32, box_h as u32));
            draw_text(canvas, texture_creator, font, "Settings", menu_text_c, box_x + 12, box_y + 8);

            for (i, item) in SettingsItem::ALL.iter().enumerate() {
                let y = box_y + 40 + i as i32 * 28;
                if i == *selected {
                    canvas.set_draw_color(menu_selected_c);
                    let _ = canvas.fill_rect(Rect::new(box_x + 8, y - 4, (box_w - 16) as u32, 28));
                }
                draw_text(canvas, texture_creator, font, item.label(), menu_text_c, box_x + 16, y);
            }
        }
        Overlay::Prompt { text } => {
            canvas.set_draw_color(colors.overlay_rgba);
            let _ = canvas.fill_rect(Rect::new(0, 0, w as u32, h as u32));

            let box_w = w / 2;
            let box_h = 84;
            let box_x = (w - box_w) / 2;
            let box_y = (h - box_h) / 2;
            canvas.set_draw_color(menu_box_c);
            let _ = canvas.fill_rect(Rect::new(box_x, box_y, box_w as u32, box_h as u32));
            draw_text(canvas, texture_creator, font, "Folder name", menu_text_c, box_x + 12, box_y + 8);

            canvas.set_draw_color(menu_selected_c);
            let _ = canvas.fill_rect(Rect::new(box_x + 8, box_y + 40, (box_w - 16) as u32, 30));
            let shown = format!("{}_", text);
            draw_text(canvas, texture_creator, font, &shown, colors.text_primary, box_x + 16, box_y + 46);
        }
    }
}
