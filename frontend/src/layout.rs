use crate::anim::{Transform, Vec2};

/// Grid geometry for the icon wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    /// Top-left of slot (0, 0).
    pub origin: Vec2,
    pub icon_size: f32,
    pub padding: f32,
    /// Extra row pitch reserved for the title under each icon.
    pub label_padding: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            origin: Vec2::new(40.0, 60.0),
            icon_size: 150.0,
            padding: 40.0,
            label_padding: 24.0,
        }
    }
}

impl GridLayout {
    /// (row, col) of a slot. `cols` below one is treated as one.
    pub fn slot(index: usize, cols: usize) -> (usize, usize) {
        let cols = cols.max(1);
        (index / cols, index % cols)
    }

    pub fn col_pitch(&self) -> f32 {
        self.icon_size + self.padding
    }

    pub fn row_pitch(&self) -> f32 {
        self.icon_size + self.padding + self.label_padding
    }

    pub fn position(&self, index: usize, cols: usize) -> Vec2 {
        let (row, col) = Self::slot(index, cols);
        Vec2::new(
            self.origin.x + col as f32 * self.col_pitch(),
            self.origin.y + row as f32 * self.row_pitch(),
        )
    }

    /// Retarget every transform onto its grid slot.
    pub fn layout(&self, transforms: &mut [Transform], cols: usize) {
        for (i, t) in transforms.iter_mut().enumerate() {
            t.set_target(self.position(i, cols));
        }
    }

    /// Origin that centers `cols` columns horizontally on a surface.
    pub fn centered(mut self, surface_w: i32, cols: usize) -> Self {
        let cols = cols.max(1) as f32;
        let grid_w = cols * self.col_pitch() - self.padding;
        self.origin.x = ((surface_w as f32 - grid_w) / 2.0).max(0.0);
        self
    }

    /// Animated bounds of an item: the icon square shrunk about its center by `scale`.
    pub fn bounds(&self, t: &Transform) -> (Vec2, f32) {
        let size = self.icon_size * t.scale;
        let inset = (self.icon_size - size) / 2.0;
        (Vec2::new(t.pos.x + inset, t.pos.y + inset), size)
    }

    pub fn hit(&self, t: &Transform, point: Vec2) -> bool {
        let (top_left, size) = self.bounds(t);
        point.x >= top_left.x
            && point.x < top_left.x + size
            && point.y >= top_left.y
            && point.y < top_left.y + size
    }
}
