//! Media playback seam.
//!
//! Sample playback goes through the [`Media`] trait: the sampler allocates
//! players, starts them, and learns about readiness and completion from
//! [`MediaEvent`]s drained on the host's single thread. Nothing here is
//! polled with a timer; flags downstream change only when an event says so.
//!
//! Two implementations ship with the crate:
//! - [`BufferMedia`]: players over PCM clips the embedder registered up
//!   front. The default, since decoding assets is not this crate's job.
//! - [`WavMedia`]: resolves player URLs against a root directory and decodes
//!   WAV files through `hound` on first use.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle for one playback unit inside a media backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaEventKind {
    /// The player has buffered enough to play through. Fires once.
    CanPlayThrough,
    /// Playback actually started.
    Started,
    /// Playback reached the natural end of the clip.
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaEvent {
    pub player: PlayerId,
    pub kind: MediaEventKind,
}

/// A backend that owns playback units and mixes them into the output bus.
pub trait Media {
    /// Create a player for `url`. The player is not ready until a
    /// [`MediaEventKind::CanPlayThrough`] event arrives for it.
    fn create_player(&mut self, url: &str) -> PlayerId;

    /// Set the playback rate applied the next time the player starts.
    fn set_rate(&mut self, player: PlayerId, rate: f64);

    /// Set the stereo pan position in `-1.0..=1.0`.
    fn set_pan(&mut self, player: PlayerId, pan: f32);

    /// Start playback from the beginning of the clip.
    fn play(&mut self, player: PlayerId);

    /// Drain events gathered since the last call.
    fn poll_events(&mut self) -> Vec<MediaEvent>;

    /// Mix-add all running players into `out` (interleaved stereo).
    fn render(&mut self, out: &mut [f32], sample_rate: u32);
}

/// A mono PCM clip.
#[derive(Clone, Debug)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

struct BufferPlayer {
    clip: Option<Arc<Clip>>,
    /// Fractional read position in clip samples.
    position: f64,
    rate: f64,
    pan: f32,
    running: bool,
}

/// [`Media`] over embedder-registered PCM clips.
#[derive(Default)]
pub struct BufferMedia {
    clips: HashMap<String, Arc<Clip>>,
    players: Vec<BufferPlayer>,
    events: Vec<MediaEvent>,
}

impl BufferMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip under a URL. Players created for that URL afterwards
    /// become ready; players created before stay silent forever.
    pub fn register(&mut self, url: &str, clip: Clip) {
        self.clips.insert(url.to_string(), Arc::new(clip));
    }
}

/// Equal-power stereo pan gains for a position in `-1.0..=1.0`.
fn pan_gains(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * core::f32::consts::FRAC_PI_4;
    (angle.cos(), angle.sin())
}

impl Media for BufferMedia {
    fn create_player(&mut self, url: &str) -> PlayerId {
        let id = PlayerId(self.players.len() as u32);
        let clip = self.clips.get(url).cloned();
        if clip.is_some() {
            self.events.push(MediaEvent { player: id, kind: MediaEventKind::CanPlayThrough });
        } else {
            log::warn!("media: no clip registered for {url:?}; player {} stays unready", id.0);
        }
        self.players.push(BufferPlayer {
            clip,
            position: 0.0,
            rate: 1.0,
            pan: 0.0,
            running: false,
        });
        id
    }

    fn set_rate(&mut self, player: PlayerId, rate: f64) {
        if let Some(p) = self.players.get_mut(player.0 as usize) {
            p.rate = rate;
        }
    }

    fn set_pan(&mut self, player: PlayerId, pan: f32) {
        if let Some(p) = self.players.get_mut(player.0 as usize) {
            p.pan = pan;
        }
    }

    fn play(&mut self, player: PlayerId) {
        let Some(p) = self.players.get_mut(player.0 as usize) else {
            return;
        };
        if p.clip.is_none() {
            return;
        }
        p.position = 0.0;
        p.running = true;
        self.events.push(MediaEvent { player, kind: MediaEventKind::Started });
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.events)
    }

    fn render(&mut self, out: &mut [f32], sample_rate: u32) {
        for (idx, p) in self.players.iter_mut().enumerate() {
            if !p.running {
                continue;
            }
            let Some(clip) = p.clip.as_ref() else {
                continue;
            };

            let step = p.rate * clip.sample_rate as f64 / sample_rate as f64;
            let (gain_l, gain_r) = pan_gains(p.pan);
            let len = clip.samples.len();

            for frame in out.chunks_exact_mut(2) {
                let base = p.position.floor() as usize;
                if base + 1 >= len {
                    p.running = false;
                    self.events.push(MediaEvent {
                        player: PlayerId(idx as u32),
                        kind: MediaEventKind::Ended,
                    });
                    break;
                }
                let frac = (p.position - base as f64) as f32;
                let sample = clip.samples[base] * (1.0 - frac) + clip.samples[base + 1] * frac;
                frame[0] += sample * gain_l;
                frame[1] += sample * gain_r;
                p.position += step;
            }
        }
    }
}

/// [`Media`] that lazily decodes WAV files from disk.
///
/// URLs are resolved relative to `root`; decode failures are logged and the
/// player simply never becomes ready, mirroring a media element whose source
/// failed to load.
pub struct WavMedia {
    inner: BufferMedia,
    root: PathBuf,
}

impl WavMedia {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { inner: BufferMedia::new(), root: root.into() }
    }

    fn load_clip(&mut self, url: &str) {
        if self.inner.clips.contains_key(url) {
            return;
        }
        let path = self.root.join(url.trim_start_matches("./"));
        match decode_wav(&path) {
            Ok(clip) => {
                self.inner.register(url, clip);
            }
            Err(err) => {
                log::warn!("media: failed to load {}: {err}", path.display());
            }
        }
    }
}

fn decode_wav(path: &std::path::Path) -> anyhow::Result<Clip> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let mono: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => downmix(
            reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            channels,
        ),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            downmix(
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?,
                channels,
            )
        }
    };

    Ok(Clip { samples: mono, sample_rate: spec.sample_rate })
}

fn downmix(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

impl Media for WavMedia {
    fn create_player(&mut self, url: &str) -> PlayerId {
        self.load_clip(url);
        self.inner.create_player(url)
    }

    fn set_rate(&mut self, player: PlayerId, rate: f64) {
        self.inner.set_rate(player, rate);
    }

    fn set_pan(&mut self, player: PlayerId, pan: f32) {
        self.inner.set_pan(player, pan);
    }

    fn play(&mut self, player: PlayerId) {
        self.inner.play(player);
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.inner.poll_events()
    }

    fn render(&mut self, out: &mut [f32], sample_rate: u32) {
        self.inner.render(out, sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_clip(len: usize) -> Clip {
        Clip {
            samples: (0..len).map(|i| i as f32 / len as f32).collect(),
            sample_rate: 44100,
        }
    }

    #[test]
    fn registered_clip_makes_players_ready() {
        let mut media = BufferMedia::new();
        media.register("pop.wav", ramp_clip(8));

        let ready = media.create_player("pop.wav");
        let missing = media.create_player("absent.wav");

        let events = media.poll_events();
        assert_eq!(
            events,
            vec![MediaEvent { player: ready, kind: MediaEventKind::CanPlayThrough }]
        );
        let _ = missing;
    }

    #[test]
    fn playback_emits_started_then_ended() {
        let mut media = BufferMedia::new();
        media.register("pop.wav", ramp_clip(4));
        let id = media.create_player("pop.wav");
        media.poll_events();

        media.play(id);
        assert_eq!(
            media.poll_events(),
            vec![MediaEvent { player: id, kind: MediaEventKind::Started }]
        );

        // 4 samples at rate 1.0 finish well inside 16 output frames.
        let mut out = vec![0.0f32; 32];
        media.render(&mut out, 44100);
        assert_eq!(
            media.poll_events(),
            vec![MediaEvent { player: id, kind: MediaEventKind::Ended }]
        );
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn playback_rate_scales_consumption() {
        let mut media = BufferMedia::new();
        media.register("pop.wav", ramp_clip(64));
        let id = media.create_player("pop.wav");
        media.play(id);
        media.poll_events();

        media.set_rate(id, 2.0);
        // 16 frames at double rate consume 32 clip samples.
        let mut out = vec![0.0f32; 32];
        media.render(&mut out, 44100);
        assert!((media.players[id.0 as usize].position - 32.0).abs() < 1e-9);
    }

    #[test]
    fn pan_hard_left_silences_right_channel() {
        let mut media = BufferMedia::new();
        media.register("pop.wav", Clip { samples: vec![0.5; 64], sample_rate: 44100 });
        let id = media.create_player("pop.wav");
        media.play(id);
        media.set_pan(id, -1.0);

        let mut out = vec![0.0f32; 8];
        media.render(&mut out, 44100);
        assert!(out[0] > 0.4);
        assert!(out[1].abs() < 1e-6);
    }

    #[test]
    fn unready_player_ignores_play() {
        let mut media = BufferMedia::new();
        let id = media.create_player("absent.wav");
        media.poll_events();
        media.play(id);
        assert!(media.poll_events().is_empty());
    }
}
