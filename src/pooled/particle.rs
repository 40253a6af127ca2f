// Particle - short-lived visual effect recycled through a pool

use crate::blocks::types::Point;
use crate::resource::Poolable;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Point,
    /// Remaining lifetime in seconds
    pub life: f32,
    pub size: f32,
}

impl Particle {
    pub fn new() -> Self {
        Self {
            position: Point::default(),
            velocity: Point::default(),
            life: 0.0,
            size: 1.0,
        }
    }

    pub fn spawn(&mut self, position: Point, velocity: Point, life: f32) {
        self.position = position;
        self.velocity = velocity;
        self.life = life;
    }

    /// Advance by `dt` seconds; returns false once the particle has expired
    pub fn update(&mut self, dt: f32) -> bool {
        self.position = self
            .position
            .offset(self.velocity.x * dt as f64, self.velocity.y * dt as f64);
        self.life -= dt;
        self.is_alive()
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new()
    }
}

impl Poolable for Particle {
    fn reset(&mut self) {
        *self = Self::new();
    }
}
