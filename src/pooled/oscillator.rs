// PooledOscillator - voice oscillator recycled through a pool
//
// Sources borrow one per sounding voice and hand it back when the voice stops.

use crate::resource::Poolable;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformType {
    Sine,
    Square,
    Saw,
    Triangle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PooledOscillator {
    waveform: WaveformType,
    frequency: f32,
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
    playing: bool,
}

impl PooledOscillator {
    pub fn new() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }

    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            waveform: WaveformType::Sine,
            frequency: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
            playing: false,
        }
    }

    pub fn start(&mut self, frequency: f32, waveform: WaveformType) {
        self.waveform = waveform;
        self.set_frequency(frequency);
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phase_increment = frequency / self.sample_rate;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn waveform(&self) -> WaveformType {
        self.waveform
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.playing {
            return 0.0;
        }

        let sample = match self.waveform {
            WaveformType::Sine => (self.phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Saw => (self.phase * 2.0) - 1.0,
            WaveformType::Triangle => {
                if self.phase < 0.5 {
                    (self.phase * 4.0) - 1.0
                } else {
                    3.0 - (self.phase * 4.0)
                }
            }
        };

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }
}

impl Default for PooledOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Poolable for PooledOscillator {
    fn reset(&mut self) {
        *self = Self::with_sample_rate(self.sample_rate);
    }
}
