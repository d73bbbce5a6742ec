/// Easing rate; higher settles faster.
pub const EASE_RATE: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[cfg(test)]
    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Per-item position and scale easing toward a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub pos: Vec2,
    pub target: Vec2,
    pub scale: f32,
}

impl Transform {
    /// New transform sitting on its slot at zero scale, so it grows in.
    pub fn spawn_at(pos: Vec2) -> Self {
        Self {
            pos,
            target: pos,
            scale: 0.0,
        }
    }

    /// Retarget without touching the current position or scale.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn update(&mut self, dt: f32) {
        let t = (dt * EASE_RATE).clamp(0.0, 1.0);
        if t == 0.0 {
            return;
        }
        self.pos.x += (self.target.x - self.pos.x) * t;
        self.pos.y += (self.target.y - self.pos.y) * t;
        self.scale += (1.0 - self.scale) * t;
    }

    #[cfg(test)]
    pub fn settled(&self, epsilon: f32) -> bool {
        self.pos.distance(self.target) <= epsilon && (1.0 - self.scale).abs() <= epsilon
    }
}
