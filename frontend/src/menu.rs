//! Navigation and selection state machine.
//!
//! Owns the item tree, the active view, the selection index, the pointer
//! cursor and the per-item transforms of the visible collection. Only the
//! frame loop mutates it; the renderer reads it.

use tracing::{debug, info};

use crate::anim::{Transform, Vec2};
use crate::input::{Direction, MenuAction};
use crate::layout::GridLayout;
use crate::model::{self, Folder, Game, Item};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuState {
    Root,
    /// Index path from the root to the open folder.
    InFolder(Vec<usize>),
    Launching,
}

/// Which input last drove navigation; decides how `Activate` picks its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Pointer,
    Index,
}

/// What the host has to do after an action was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Launch(Game),
    OpenSettings,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    surface_w: i32,
    surface_h: i32,
}

impl Cursor {
    /// Cursor centered on the surface.
    pub fn new(surface_w: i32, surface_h: i32, w: i32, h: i32) -> Self {
        let mut c = Self {
            x: surface_w / 2,
            y: surface_h / 2,
            w,
            h,
            surface_w,
            surface_h,
        };
        c.move_by(0, 0);
        c
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.x = (self.x.saturating_add(dx)).min(self.surface_w - self.w).max(0);
        self.y = (self.y.saturating_add(dy)).min(self.surface_h - self.h).max(0);
    }

    pub fn hotspot(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }
}

pub struct MenuMachine {
    root: Vec<Item>,
    view: Vec<usize>,
    selection: usize,
    transforms: Vec<Transform>,
    grid: GridLayout,
    cols: usize,
    cursor: Cursor,
    focus: Focus,
    launching: bool,
    quit: bool,
}

impl MenuMachine {
    pub fn new(root: Vec<Item>, grid: GridLayout, cols: usize, cursor: Cursor) -> Self {
        let mut m = Self {
            root,
            view: Vec::new(),
            selection: 0,
            transforms: Vec::new(),
            grid,
            cols: cols.max(1),
            cursor,
            focus: Focus::Index,
            launching: false,
            quit: false,
        };
        m.rebuild_view();
        m
    }

    pub fn state(&self) -> MenuState {
        if self.launching {
            MenuState::Launching
        } else if self.view.is_empty() {
            MenuState::Root
        } else {
            MenuState::InFolder(self.view.clone())
        }
    }

    /// Items of the active view.
    pub fn items(&self) -> &[Item] {
        model::collection(&self.root, &self.view).unwrap_or(&[])
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Folder titles from the root down to the active view.
    pub fn view_titles(&self) -> Vec<String> {
        model::folder_titles(&self.root, &self.view)
    }

    /// Position of each open folder among its sibling folders, root first.
    pub fn view_folder_slots(&self) -> Vec<usize> {
        model::folder_slots(&self.root, &self.view).unwrap_or_default()
    }

    /// Item an `Activate` would resolve to right now.
    pub fn targeted(&self) -> Option<usize> {
        match self.focus {
            Focus::Pointer => {
                let hotspot = self.cursor.hotspot();
                self.transforms
                    .iter()
                    .position(|t| self.grid.hit(t, hotspot))
            }
            Focus::Index => {
                if self.items().is_empty() {
                    None
                } else {
                    Some(self.selection)
                }
            }
        }
    }

    pub fn apply(&mut self, action: MenuAction) -> Effect {
        if self.quit {
            debug!(?action, "dropped after quit");
            return Effect::None;
        }
        match action {
            MenuAction::Quit => {
                self.quit = true;
                Effect::Quit
            }
            MenuAction::MoveCursor(dx, dy) => {
                self.cursor.move_by(dx, dy);
                self.focus = Focus::Pointer;
                Effect::None
            }
            MenuAction::Step(dir) => {
                self.step(dir);
                Effect::None
            }
            MenuAction::Activate => self.activate(),
            MenuAction::Back => {
                self.back();
                Effect::None
            }
            MenuAction::OpenSettings => {
                if self.launching {
                    Effect::None
                } else {
                    Effect::OpenSettings
                }
            }
        }
    }

    fn activate(&mut self) -> Effect {
        if self.launching {
            debug!("activate ignored, launch pending");
            return Effect::None;
        }
        if self.items().is_empty() {
            debug!("activate on empty view");
            return Effect::None;
        }
        let Some(idx) = self.targeted() else {
            debug!("activate resolved no item");
            return Effect::None;
        };
        match self.items().get(idx) {
            Some(Item::Folder(f)) => {
                info!("entering folder {}", f.title);
                self.view.push(idx);
                self.selection = 0;
                self.rebuild_view();
                Effect::None
            }
            Some(Item::Game(g)) => {
                let game = g.clone();
                info!("launching {}", game.title);
                self.launching = true;
                Effect::Launch(game)
            }
            None => Effect::None,
        }
    }

    fn back(&mut self) {
        if self.launching {
            return;
        }
        let Some(folder_idx) = self.view.pop() else {
            return;
        };
        self.rebuild_view();
        self.selection = if folder_idx < self.items().len() {
            folder_idx
        } else {
            0
        };
        debug!(selection = self.selection, "left folder");
    }

    fn step(&mut self, dir: Direction) {
        self.focus = Focus::Index;
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let cols = self.cols;
        let s = self.selection;
        self.selection = match dir {
            Direction::Left if s % cols > 0 => s - 1,
            Direction::Right if s % cols + 1 < cols && s + 1 < len => s + 1,
            Direction::Up if s >= cols => s - cols,
            Direction::Down if s + cols < len => s + cols,
            _ => s,
        };
    }

    /// Called by the frame loop when the launch collaborator reported failure.
    pub fn launch_failed(&mut self) {
        self.launching = false;
    }

    /// Append an empty folder to the active view. Selection is left alone.
    pub fn create_folder(&mut self, name: &str) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let items = model::collection_mut(&mut self.root, &self.view)?;
        items.push(Item::Folder(Folder::new(name)));
        let idx = items.len() - 1;
        self.transforms
            .push(Transform::spawn_at(self.grid.position(idx, self.cols)));
        self.grid.layout(&mut self.transforms, self.cols);
        info!("created folder {} at slot {}", name, idx);
        Some(idx)
    }

    /// Advance every visible transform.
    pub fn update(&mut self, dt: f32) {
        for t in &mut self.transforms {
            t.update(dt);
        }
    }

    fn rebuild_view(&mut self) {
        let len = self.items().len();
        self.transforms = (0..len)
            .map(|i| Transform::spawn_at(self.grid.position(i, self.cols)))
            .collect();
        self.grid.layout(&mut self.transforms, self.cols);
        if self.selection >= len {
            self.selection = 0;
        }
    }
}
