//! Oscillator voices.
//!
//! A sparse table of sustained tones keyed by note index. A voice's generator
//! is created on the first press of its index and runs from then on; press
//! and release only reshape the envelope, so a released voice can be
//! re-sustained without a click and without allocating a second generator.
//!
//! Envelope shape: linear attack to full level, exponential decay toward a
//! sustain level while held, exponential release toward zero. A press on an
//! already-live voice retriggers from the envelope's current level.

use crate::audio::param::AudioParam;

pub const ATTACK_TIME: f64 = 0.03;
pub const DECAY_TIME_CONSTANT: f64 = 0.01;
pub const SUSTAIN_LEVEL: f32 = 0.5;
pub const RELEASE_TIME_CONSTANT: f64 = 0.05;

/// Tone generator shape.
#[derive(Clone, Debug)]
pub enum Waveform {
    Sine,
    /// Periodic waveform built from harmonic terms: `sine_terms[k]` and
    /// `cosine_terms[k]` weight the k-th harmonic (index 0 is unused, as in
    /// a Fourier series constant term).
    Custom { sine_terms: Vec<f32>, cosine_terms: Vec<f32> },
}

impl Waveform {
    /// The keyboard timbre: fundamental plus a fourth harmonic.
    pub fn keyboard() -> Self {
        Waveform::Custom {
            sine_terms: vec![0.0, 0.0, 1.0, 0.0, 1.0],
            cosine_terms: vec![0.0; 5],
        }
    }

    fn sample(&self, phase: f64) -> f32 {
        match self {
            Waveform::Sine => phase.sin() as f32,
            Waveform::Custom { sine_terms, cosine_terms } => {
                let mut sum = 0.0f64;
                let mut norm = 0.0f64;
                for (k, b) in sine_terms.iter().enumerate().skip(1) {
                    sum += *b as f64 * (phase * k as f64).sin();
                    norm += (*b as f64).abs();
                }
                for (k, a) in cosine_terms.iter().enumerate().skip(1) {
                    sum += *a as f64 * (phase * k as f64).cos();
                    norm += (*a as f64).abs();
                }
                if norm > 0.0 { (sum / norm) as f32 } else { 0.0 }
            }
        }
    }
}

#[derive(Debug)]
struct Oscillator {
    phase: f64,
    frequency: f64,
}

impl Oscillator {
    fn next(&mut self, waveform: &Waveform, sample_rate: u32) -> f32 {
        let value = waveform.sample(self.phase);
        self.phase += core::f64::consts::TAU * self.frequency / sample_rate as f64;
        if self.phase >= core::f64::consts::TAU {
            self.phase -= core::f64::consts::TAU;
        }
        value
    }
}

/// One sustained tone: generator plus envelope.
#[derive(Debug)]
pub struct Voice {
    osc: Oscillator,
    amp: AudioParam,
    pressed: bool,
}

impl Voice {
    fn new() -> Self {
        Self {
            osc: Oscillator { phase: 0.0, frequency: 0.0 },
            amp: AudioParam::new(0.0),
            pressed: false,
        }
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    pub fn envelope_level(&self, t: f64) -> f32 {
        self.amp.value_at(t)
    }
}

/// Sparse voice table, indexed by note index.
pub struct Synth {
    voices: Vec<Option<Voice>>,
    waveform: Waveform,
    created: u64,
}

impl Synth {
    pub fn new(waveform: Waveform) -> Self {
        Self { voices: Vec::new(), waveform, created: 0 }
    }

    /// Begin or retrigger the voice at `index` with frequency `freq`.
    pub fn note_pressed(&mut self, index: usize, freq: f64, now: f64) {
        if index >= self.voices.len() {
            self.voices.resize_with(index + 1, || None);
        }
        if self.voices[index].is_none() {
            self.created += 1;
            log::debug!("note {index}: allocating generator");
        }
        let voice = self.voices[index].get_or_insert_with(Voice::new);

        // Retrigger from wherever the envelope currently sits, not from zero.
        let level = voice.amp.value_at(now);
        voice.osc.frequency = freq;
        voice.pressed = true;
        voice.amp.cancel_scheduled_values(now);
        voice.amp.set_value_at(level, now);
        voice.amp.linear_ramp_to_value_at(1.0, now + ATTACK_TIME);
        voice.amp.set_target_at(SUSTAIN_LEVEL, now + ATTACK_TIME, DECAY_TIME_CONSTANT);
    }

    /// Release the voice at `index`. A never-pressed index is a no-op.
    pub fn note_released(&mut self, index: usize, now: f64) {
        let Some(Some(voice)) = self.voices.get_mut(index) else {
            return;
        };
        let level = voice.amp.value_at(now);
        voice.amp.cancel_scheduled_values(now);
        voice.amp.set_value_at(level, now);
        voice.amp.set_target_at(0.0, now, RELEASE_TIME_CONSTANT);
        voice.pressed = false;
    }

    /// Mix-add all voices into `out` (interleaved stereo) starting at
    /// `start_time` on the audio clock.
    pub fn render(&mut self, out: &mut [f32], sample_rate: u32, start_time: f64) {
        if self.voices.iter().all(Option::is_none) {
            return;
        }
        for (frame_idx, frame) in out.chunks_exact_mut(2).enumerate() {
            let t = start_time + frame_idx as f64 / sample_rate as f64;
            let mut sum = 0.0f32;
            for voice in self.voices.iter_mut().flatten() {
                sum += voice.osc.next(&self.waveform, sample_rate) * voice.amp.value_at(t);
            }
            frame[0] += sum;
            frame[1] += sum;
        }
    }

    /// How many generators have been allocated over the synth's lifetime.
    pub fn created_count(&self) -> u64 {
        self.created
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_press_reuses_the_generator() {
        let mut synth = Synth::new(Waveform::Sine);
        synth.note_pressed(5, 440.0, 0.0);
        synth.note_pressed(5, 440.0, 0.5);
        assert_eq!(synth.created_count(), 1);
        // Sparse table: only index 5 exists.
        assert!(synth.voice(0).is_none());
        assert!(synth.voice(5).is_some());
    }

    #[test]
    fn releasing_an_absent_index_is_a_no_op() {
        let mut synth = Synth::new(Waveform::Sine);
        synth.note_released(3, 0.0);
        assert_eq!(synth.created_count(), 0);
        assert!(synth.voice(3).is_none());
    }

    #[test]
    fn envelope_attacks_then_decays_to_sustain() {
        let mut synth = Synth::new(Waveform::Sine);
        synth.note_pressed(0, 220.0, 0.0);
        let voice = synth.voice(0).unwrap();

        assert!(voice.pressed());
        // Peak at the end of the attack.
        assert!((voice.envelope_level(ATTACK_TIME) - 1.0).abs() < 1e-4);
        // Long after, the decay has settled at the sustain level.
        assert!((voice.envelope_level(1.0) - SUSTAIN_LEVEL).abs() < 1e-3);
    }

    #[test]
    fn release_ramps_toward_silence_without_dropping_the_voice() {
        let mut synth = Synth::new(Waveform::Sine);
        synth.note_pressed(2, 330.0, 0.0);
        synth.note_released(2, 1.0);

        let voice = synth.voice(2).unwrap();
        assert!(!voice.pressed());
        let just_after = voice.envelope_level(1.001);
        assert!(just_after > 0.4, "release starts from the sustain level");
        assert!(voice.envelope_level(2.0) < 1e-3);

        // Re-press after release reuses the same generator.
        synth.note_pressed(2, 330.0, 3.0);
        assert_eq!(synth.created_count(), 1);
        assert!(synth.voice(2).unwrap().pressed());
    }

    #[test]
    fn retrigger_resumes_from_current_level() {
        let mut synth = Synth::new(Waveform::Sine);
        synth.note_pressed(1, 440.0, 0.0);
        // Half-way up the attack the level is 0.5; retrigger there.
        synth.note_pressed(1, 440.0, ATTACK_TIME / 2.0);
        let voice = synth.voice(1).unwrap();
        let level = voice.envelope_level(ATTACK_TIME / 2.0);
        assert!((level - 0.5).abs() < 1e-4, "expected anchor at 0.5, got {level}");
    }

    #[test]
    fn custom_waveform_mixes_harmonics() {
        let wave = Waveform::keyboard();
        // At phase 0 every sine harmonic is zero.
        assert!(wave.sample(0.0).abs() < 1e-6);
        // At phase pi/4 the second and fourth harmonics contribute 1 and 0.
        let v = wave.sample(core::f64::consts::FRAC_PI_4);
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn render_is_silent_before_any_press_and_audible_after() {
        let mut synth = Synth::new(Waveform::Sine);
        let mut out = vec![0.0f32; 128];
        synth.render(&mut out, 44100, 0.0);
        assert!(out.iter().all(|s| *s == 0.0));

        synth.note_pressed(0, 440.0, 0.0);
        let mut out = vec![0.0f32; 4096];
        synth.render(&mut out, 44100, 0.0);
        assert!(out.iter().any(|s| s.abs() > 0.01));
    }
}
