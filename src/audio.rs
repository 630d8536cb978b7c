//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each effect is a short list of oscillator notes; the browser side only
//! schedules them.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Jump,
    /// Fish picked up (carry rules)
    Pickup,
    /// Fish counted, either delivered or touched
    Collect,
    /// Fell out of the world
    Respawn,
    RoundStart,
    Win,
    TimeUp,
    /// New best score
    HighScore,
}

impl SoundEffect {
    /// Sound for a game event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Jumped => Some(SoundEffect::Jump),
            GameEvent::FishPickedUp { .. } => Some(SoundEffect::Pickup),
            GameEvent::FishCollected { .. } | GameEvent::FishDelivered { .. } => {
                Some(SoundEffect::Collect)
            }
            GameEvent::Respawned => Some(SoundEffect::Respawn),
            GameEvent::RoundAdvanced { .. } => Some(SoundEffect::RoundStart),
            GameEvent::Won { .. } => Some(SoundEffect::Win),
            GameEvent::TimeUp { .. } => Some(SoundEffect::TimeUp),
            GameEvent::QuotaMet { .. } => None,
        }
    }

    /// Notes making up the effect
    pub fn notes(&self) -> &'static [Note] {
        match self {
            SoundEffect::Jump => JUMP,
            SoundEffect::Pickup => PICKUP,
            SoundEffect::Collect => COLLECT,
            SoundEffect::Respawn => RESPAWN,
            SoundEffect::RoundStart => ROUND_START,
            SoundEffect::Win => WIN,
            SoundEffect::TimeUp => TIME_UP,
            SoundEffect::HighScore => HIGH_SCORE,
        }
    }
}

const JUMP: &[Note] = &[Note::slide(Wave::Square, 220.0, 440.0, 0.0, 0.12, 0.15)];

const PICKUP: &[Note] = &[
    Note::new(Wave::Triangle, 660.0, 0.0, 0.06, 0.3),
    Note::new(Wave::Triangle, 880.0, 0.06, 0.08, 0.3),
];

/// C-E-G arpeggio
const COLLECT: &[Note] = &[
    Note::new(Wave::Sine, 523.25, 0.0, 0.08, 0.4),
    Note::new(Wave::Sine, 659.25, 0.08, 0.08, 0.4),
    Note::new(Wave::Sine, 783.99, 0.16, 0.15, 0.4),
];

const RESPAWN: &[Note] = &[Note::slide(Wave::Sawtooth, 400.0, 80.0, 0.0, 0.35, 0.25)];

const ROUND_START: &[Note] = &[
    Note::new(Wave::Square, 392.0, 0.0, 0.1, 0.2),
    Note::new(Wave::Square, 523.25, 0.12, 0.2, 0.2),
];

const WIN: &[Note] = &[
    Note::new(Wave::Triangle, 523.25, 0.0, 0.12, 0.4),
    Note::new(Wave::Triangle, 659.25, 0.12, 0.12, 0.4),
    Note::new(Wave::Triangle, 783.99, 0.24, 0.12, 0.4),
    Note::new(Wave::Triangle, 1046.5, 0.36, 0.4, 0.4),
];

const TIME_UP: &[Note] = &[
    Note::new(Wave::Sawtooth, 330.0, 0.0, 0.2, 0.3),
    Note::new(Wave::Sawtooth, 262.0, 0.2, 0.2, 0.3),
    Note::slide(Wave::Sawtooth, 196.0, 110.0, 0.4, 0.5, 0.3),
];

const HIGH_SCORE: &[Note] = &[
    Note::new(Wave::Sine, 880.0, 0.0, 0.1, 0.3),
    Note::new(Wave::Sine, 1108.7, 0.1, 0.1, 0.3),
    Note::new(Wave::Sine, 1318.5, 0.2, 0.3, 0.3),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator burst: times are seconds from the effect start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub wave: Wave,
    pub freq: f32,
    /// Pitch at the end of the note (same as `freq` for a flat note)
    pub end_freq: f32,
    pub start: f64,
    pub duration: f64,
    pub gain: f32,
}

impl Note {
    const fn new(wave: Wave, freq: f32, start: f64, duration: f64, gain: f32) -> Self {
        Self::slide(wave, freq, freq, start, duration, gain)
    }

    const fn slide(
        wave: Wave,
        freq: f32,
        end_freq: f32,
        start: f64,
        duration: f64,
        gain: f32,
    ) -> Self {
        Self {
            wave,
            freq,
            end_freq,
            start,
            duration,
            gain,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Note, SoundEffect, Wave};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // May fail outside a secure context; the game runs silent then
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: settings.effective_sfx_volume(),
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.volume = settings.effective_sfx_volume();
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let t = ctx.current_time();
            for note in effect.notes() {
                self.play_note(ctx, t, note);
            }
        }

        fn play_note(&self, ctx: &AudioContext, t0: f64, note: &Note) {
            let Some((osc, gain)) = create_osc(ctx, note.freq, oscillator_type(note.wave)) else {
                return;
            };
            let start = t0 + note.start;
            let end = start + note.duration;

            gain.gain().set_value_at_time(0.0, t0).ok();
            gain.gain()
                .set_value_at_time(self.volume * note.gain, start)
                .ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
            if note.end_freq != note.freq {
                osc.frequency().set_value_at_time(note.freq, start).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(note.end_freq, end)
                    .ok();
            }

            osc.start_with_when(start).ok();
            osc.stop_with_when(end + 0.02).ok();
        }
    }

    fn oscillator_type(wave: Wave) -> OscillatorType {
        match wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Triangle => OscillatorType::Triangle,
            Wave::Sawtooth => OscillatorType::Sawtooth,
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_sounds() {
        assert_eq!(SoundEffect::for_event(&GameEvent::Jumped), Some(SoundEffect::Jump));
        assert_eq!(
            SoundEffect::for_event(&GameEvent::FishDelivered { fish: 0, total: 1 }),
            Some(SoundEffect::Collect)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::QuotaMet { round: 1 }), None);
    }

    #[test]
    fn test_notes_well_formed() {
        let all = [
            SoundEffect::Jump,
            SoundEffect::Pickup,
            SoundEffect::Collect,
            SoundEffect::Respawn,
            SoundEffect::RoundStart,
            SoundEffect::Win,
            SoundEffect::TimeUp,
            SoundEffect::HighScore,
        ];
        let mut total = 0;
        for effect in all {
            let notes = effect.notes();
            assert!(!notes.is_empty());
            total += notes.len();
            for note in notes {
                // Exponential ramps cannot reach or leave zero
                assert!(note.freq > 0.0 && note.end_freq > 0.0);
                assert!(note.duration > 0.0 && note.gain > 0.0 && note.gain <= 1.0);
            }
        }
        assert_eq!(total, 19);
        assert_eq!(SoundEffect::Jump.notes()[0].end_freq, 440.0);
    }
}
