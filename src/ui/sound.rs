/// Sound engine: procedural chimes for game events via rodio.
///
/// All effects are synthesized into in-memory WAV buffers at init time and
/// played fire-and-forget through rodio's output thread.
///
/// Build without the "sound" feature to drop audio entirely (the stub
/// SoundEngine does nothing).

use crate::sim::controller::GameMode;
use crate::sim::event::GameEvent;

/// Which effect an event should trigger, if any.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Flip,
    Start,
    Pause,
    Reveal,
    Tick,
    Win,
}

pub fn cue_for(event: &GameEvent) -> Option<Cue> {
    match event {
        GameEvent::ImageChanged { .. } => Some(Cue::Flip),
        GameEvent::RevealStarted | GameEvent::RevealRestarted => Some(Cue::Start),
        GameEvent::RevealPaused => Some(Cue::Pause),
        GameEvent::RevealCompleted => Some(Cue::Reveal),
        GameEvent::DurationChanged { .. } => Some(Cue::Tick),
        GameEvent::ModeChanged { to: GameMode::Win, .. } => Some(Cue::Win),
        GameEvent::ModeChanged { to: GameMode::Active, .. } => Some(Cue::Start),
        GameEvent::ModeChanged { .. } => None,
    }
}

#[cfg(any(feature = "sound", test))]
mod synth {
    use std::f32::consts::TAU;

    pub const SAMPLE_RATE: u32 = 22050;

    fn samples_for(secs: f32) -> usize {
        (SAMPLE_RATE as f32 * secs) as usize
    }

    /// One sine note with a linear decay to `1 - decay`.
    fn note(out: &mut Vec<f32>, freq: f32, secs: f32, decay: f32, volume: f32) {
        let n = samples_for(secs);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32) * decay;
            out.push((t * freq * TAU).sin() * env * volume);
        }
    }

    /// Image flip: quick downward swoosh.
    pub fn flip() -> Vec<f32> {
        let n = samples_for(0.07);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (900.0 - 500.0 * t) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * 0.2
            })
            .collect()
    }

    /// Reveal running: two rising notes.
    pub fn start() -> Vec<f32> {
        let mut out = Vec::new();
        note(&mut out, 523.0, 0.05, 0.4, 0.25); // C5
        note(&mut out, 784.0, 0.08, 1.0, 0.25); // G5
        out
    }

    /// Reveal paused: the same two notes falling.
    pub fn pause() -> Vec<f32> {
        let mut out = Vec::new();
        note(&mut out, 784.0, 0.05, 0.4, 0.25);
        note(&mut out, 523.0, 0.08, 1.0, 0.25);
        out
    }

    /// Fully revealed: bell-like major triad with an octave partial.
    pub fn reveal() -> Vec<f32> {
        let n = samples_for(0.6);
        let partials = [(659.0_f32, 0.5), (831.0, 0.3), (988.0, 0.3), (1318.0, 0.15)]; // E5 G#5 B5 E6
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (-4.0 * t).exp();
                let wave: f32 = partials.iter().map(|&(f, a)| (t * f * TAU).sin() * a).sum();
                wave * env * 0.2
            })
            .collect()
    }

    /// Duration nudge: tiny click.
    pub fn tick() -> Vec<f32> {
        let mut out = Vec::new();
        note(&mut out, 1760.0, 0.02, 1.0, 0.15);
        out
    }

    /// Session over: ascending arpeggio with a held top note.
    pub fn win() -> Vec<f32> {
        let mut out = Vec::new();
        for freq in [392.0_f32, 523.0, 659.0] { // G4 C5 E5
            note(&mut out, freq, 0.09, 0.3, 0.3);
        }
        note(&mut out, 784.0, 0.35, 1.0, 0.3); // G5
        out
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV file.
    pub fn wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_len = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_len as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Cue};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        flip: Arc<Vec<u8>>,
        start: Arc<Vec<u8>>,
        pause: Arc<Vec<u8>>,
        reveal: Arc<Vec<u8>>,
        tick: Arc<Vec<u8>>,
        win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("No audio output, sound disabled: {e}");
                    return None;
                }
            };
            let bake = |samples: Vec<f32>| Arc::new(synth::wav(&samples));

            Some(SoundEngine {
                _stream: stream,
                handle,
                flip: bake(synth::flip()),
                start: bake(synth::start()),
                pause: bake(synth::pause()),
                reveal: bake(synth::reveal()),
                tick: bake(synth::tick()),
                win: bake(synth::win()),
            })
        }

        pub fn play(&self, cue: Cue) {
            let buf = match cue {
                Cue::Flip => &self.flip,
                Cue::Start => &self.start,
                Cue::Pause => &self.pause,
                Cue::Reveal => &self.reveal,
                Cue::Tick => &self.tick,
                Cue::Win => &self.win,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_to_cues() {
        assert_eq!(cue_for(&GameEvent::ImageChanged { index: 2 }), Some(Cue::Flip));
        assert_eq!(cue_for(&GameEvent::RevealCompleted), Some(Cue::Reveal));
        assert_eq!(
            cue_for(&GameEvent::ModeChanged { from: GameMode::Active, to: GameMode::Win }),
            Some(Cue::Win),
        );
        assert_eq!(
            cue_for(&GameEvent::ModeChanged { from: GameMode::Win, to: GameMode::Menu }),
            None,
        );
    }

    #[test]
    fn wav_header_matches_payload() {
        let samples = synth::tick();
        let buf = synth::wav(&samples);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(&buf[8..16], b"WAVEfmt ");
        assert_eq!(buf.len(), 44 + samples.len() * 2);
        let data_len = u32::from_le_bytes([buf[40], buf[41], buf[42], buf[43]]);
        assert_eq!(data_len as usize, samples.len() * 2);
    }

    #[test]
    fn effects_are_audible_and_in_range() {
        for samples in [synth::flip(), synth::start(), synth::pause(), synth::reveal(), synth::win()] {
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
            assert!(samples.iter().any(|s| s.abs() > 0.01));
        }
    }
}
