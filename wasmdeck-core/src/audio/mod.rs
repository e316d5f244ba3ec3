//! Audio subsystem: oscillator voices, sample pools, master stage.
//!
//! The graph is built lazily on the first press or play call; audio backends
//! generally refuse to start outside a user-gesture-adjacent activation, so
//! nothing is constructed at program start. Once live, the signal path is
//! voices + sample players → master gain → compressor → interleaved stereo
//! f32 output, pulled by the embedder through [`AudioSystem::render`].
//!
//! The audio clock advances only while rendering; envelope automation is
//! scheduled against that clock and never awaited.

pub mod compressor;
pub mod media;
pub mod param;
pub mod sampler;
pub mod synth;

use compressor::{Compressor, CompressorParams};
use media::Media;
use sampler::{Sampler, SoundBank};
use synth::{Synth, Waveform};

/// Audio-side knobs. Plain data; everything has a sensible default.
#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub master_gain: f32,
    pub waveform: Waveform,
    pub bank: SoundBank,
    /// Enables per-player stereo panning in the sampler.
    pub spatial: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            master_gain: 0.5,
            waveform: Waveform::Sine,
            bank: SoundBank::new(),
            spatial: false,
        }
    }
}

struct Graph {
    synth: Synth,
    sampler: Sampler,
    media: Box<dyn Media>,
    master_gain: f32,
    compressor: Compressor,
    sample_rate: u32,
    clock: f64,
}

/// The whole audio subsystem behind the sound imports.
pub struct AudioSystem {
    config: AudioConfig,
    /// Media backend parked here until the graph comes up.
    pending_media: Option<Box<dyn Media>>,
    graph: Option<Graph>,
}

impl AudioSystem {
    pub fn new(config: AudioConfig, media: Box<dyn Media>) -> Self {
        Self { config, pending_media: Some(media), graph: None }
    }

    fn graph(&mut self) -> &mut Graph {
        let config = &self.config;
        let pending_media = &mut self.pending_media;
        self.graph.get_or_insert_with(|| {
            let media = pending_media
                .take()
                .unwrap_or_else(|| Box::new(media::BufferMedia::new()));
            log::info!(
                "audio graph up: {} Hz, master gain {}",
                config.sample_rate, config.master_gain
            );
            Graph {
                synth: Synth::new(config.waveform.clone()),
                sampler: Sampler::new(config.bank.clone(), config.spatial),
                media,
                master_gain: config.master_gain,
                compressor: Compressor::new(CompressorParams::default(), config.sample_rate),
                sample_rate: config.sample_rate,
                clock: 0.0,
            }
        })
    }

    pub fn note_pressed(&mut self, index: usize, freq: f64) {
        let graph = self.graph();
        let now = graph.clock;
        graph.synth.note_pressed(index, freq, now);
    }

    pub fn note_released(&mut self, index: usize) {
        let graph = self.graph();
        let now = graph.clock;
        graph.synth.note_released(index, now);
    }

    pub fn play_sound(&mut self, index: usize, rate: f64, pan: Option<f32>) {
        let graph = self.graph();
        graph.sampler.play(graph.media.as_mut(), index, rate, pan);
    }

    /// Set the master gain. Takes effect immediately if the graph is live,
    /// otherwise when it comes up.
    pub fn set_master_gain(&mut self, gain: f32) {
        self.config.master_gain = gain;
        if let Some(graph) = &mut self.graph {
            graph.master_gain = gain;
        }
    }

    /// Route pending media events (readiness, start, completion) to the
    /// sample pools. Called once per frame and from every render.
    pub fn pump_media_events(&mut self) {
        let Some(graph) = &mut self.graph else {
            return;
        };
        for event in graph.media.poll_events() {
            graph.sampler.handle_event(&event);
        }
    }

    /// Fill `out` (interleaved stereo f32) and advance the audio clock.
    /// Before the graph exists this produces silence.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let Some(graph) = &mut self.graph else {
            return;
        };

        graph.synth.render(out, graph.sample_rate, graph.clock);
        graph.media.render(out, graph.sample_rate);
        for frame in out.chunks_exact_mut(2) {
            frame[0] *= graph.master_gain;
            frame[1] *= graph.master_gain;
            let (mut l, mut r) = (frame[0], frame[1]);
            graph.compressor.process_frame(&mut l, &mut r);
            frame[0] = l;
            frame[1] = r;
        }
        graph.clock += (out.len() / 2) as f64 / graph.sample_rate as f64;

        self.pump_media_events();
    }

    /// Seconds of audio rendered since the graph came up.
    pub fn current_time(&self) -> f64 {
        self.graph.as_ref().map_or(0.0, |g| g.clock)
    }

    pub fn is_live(&self) -> bool {
        self.graph.is_some()
    }

    pub fn synth(&self) -> Option<&Synth> {
        self.graph.as_ref().map(|g| &g.synth)
    }

    pub fn sampler(&self) -> Option<&Sampler> {
        self.graph.as_ref().map(|g| &g.sampler)
    }
}

#[cfg(test)]
mod tests {
    use super::media::{BufferMedia, Clip};
    use super::*;

    fn system_with_clip() -> AudioSystem {
        let mut media = BufferMedia::new();
        media.register("pop.wav", Clip { samples: vec![0.5; 512], sample_rate: 44_100 });
        let mut config = AudioConfig::default();
        config.bank.add("pop.wav", 3);
        AudioSystem::new(config, Box::new(media))
    }

    #[test]
    fn graph_comes_up_lazily_on_first_use() {
        let mut audio = system_with_clip();
        assert!(!audio.is_live());

        let mut out = vec![0.0f32; 64];
        audio.render(&mut out);
        assert!(!audio.is_live(), "rendering alone must not start the graph");

        audio.note_pressed(0, 440.0);
        assert!(audio.is_live());
    }

    #[test]
    fn clock_advances_with_rendering() {
        let mut audio = system_with_clip();
        audio.note_pressed(0, 440.0);
        assert_eq!(audio.current_time(), 0.0);

        let mut out = vec![0.0f32; 44_100 * 2 / 10];
        audio.render(&mut out);
        assert!((audio.current_time() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn play_after_readiness_produces_output() {
        let mut audio = system_with_clip();

        // First play brings the graph up and allocates the pool; the player
        // is not ready yet so the request drops.
        audio.play_sound(0, 1.0, None);
        audio.pump_media_events();

        audio.play_sound(0, 1.0, None);
        let mut out = vec![0.0f32; 128];
        audio.render(&mut out);
        assert!(out.iter().any(|s| s.abs() > 1e-6));
    }

    #[test]
    fn master_gain_applies_before_the_graph_exists() {
        let mut audio = system_with_clip();
        audio.set_master_gain(0.0);
        audio.note_pressed(0, 440.0);

        let mut out = vec![0.0f32; 256];
        audio.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
