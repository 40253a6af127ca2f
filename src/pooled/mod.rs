// Pooled objects - transient render/audio objects recycled by pools

pub mod oscillator;
pub mod particle;

pub use oscillator::{PooledOscillator, WaveformType};
pub use particle::Particle;
