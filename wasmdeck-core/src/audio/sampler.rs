//! Sample voice pools.
//!
//! One pool per sound index so overlapping plays of the same sound do not cut
//! each other off. A pool starts with a single player and grows by exactly one
//! player each time a play request finds no idle ready unit, up to the
//! configured maximum; it never shrinks. A request that finds the pool
//! exhausted is dropped: logged, not queued, not retried.
//!
//! Player readiness and activity flags change only in response to
//! [`MediaEvent`]s; the pool never polls the backend.

use crate::audio::media::{Media, MediaEvent, MediaEventKind, PlayerId};

/// One playable sound: where it loads from and how many overlapping units it
/// may occupy.
#[derive(Clone, Debug)]
pub struct SoundSpec {
    pub url: String,
    pub max_pool: usize,
}

/// Sound indices as the guest sees them, in order.
#[derive(Clone, Debug, Default)]
pub struct SoundBank {
    pub sounds: Vec<SoundSpec>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sound, returning its index.
    pub fn add(&mut self, url: &str, max_pool: usize) -> usize {
        self.sounds.push(SoundSpec { url: url.to_string(), max_pool });
        self.sounds.len() - 1
    }
}

#[derive(Debug)]
struct PoolPlayer {
    id: PlayerId,
    can_play: bool,
    is_playing: bool,
}

#[derive(Debug)]
struct Pool {
    url: String,
    max_count: usize,
    players: Vec<PoolPlayer>,
}

impl Pool {
    fn add_player(&mut self, media: &mut dyn Media) {
        let id = media.create_player(&self.url);
        self.players.push(PoolPlayer { id, can_play: false, is_playing: false });
    }
}

/// Per-sound voice pools with find-idle-or-grow allocation.
pub struct Sampler {
    bank: SoundBank,
    pools: Vec<Option<Pool>>,
    /// When false, pan requests are ignored (non-spatial variant).
    spatial: bool,
}

impl Sampler {
    pub fn new(bank: SoundBank, spatial: bool) -> Self {
        let pools = (0..bank.sounds.len()).map(|_| None).collect();
        Self { bank, pools, spatial }
    }

    /// Play sound `index` at `rate`, optionally panned.
    pub fn play(&mut self, media: &mut dyn Media, index: usize, rate: f64, pan: Option<f32>) {
        let Some(spec) = self.bank.sounds.get(index) else {
            log::debug!("sound: no pool for index {index}");
            return;
        };

        let pool = self.pools[index].get_or_insert_with(|| Pool {
            url: spec.url.clone(),
            max_count: spec.max_pool.max(1),
            players: Vec::new(),
        });
        if pool.players.is_empty() {
            pool.add_player(media);
        }

        for (slot, player) in pool.players.iter_mut().enumerate() {
            if player.can_play && !player.is_playing {
                log::trace!("sound[{index}]: playing unit {slot}");
                media.set_rate(player.id, rate);
                if self.spatial {
                    if let Some(pan) = pan {
                        media.set_pan(player.id, pan);
                    }
                }
                media.play(player.id);
                return;
            }
        }

        // Exhausted: drop the request, then grow by one toward the cap so the
        // next burst finds more headroom.
        log::debug!(
            "sound[{index}]: no idle ready unit among {}, dropping request",
            pool.players.len()
        );
        if pool.players.len() < pool.max_count {
            pool.add_player(media);
        }
    }

    /// Apply a media event to whichever pool owns the player.
    pub fn handle_event(&mut self, event: &MediaEvent) {
        for pool in self.pools.iter_mut().flatten() {
            if let Some(player) = pool.players.iter_mut().find(|p| p.id == event.player) {
                match event.kind {
                    MediaEventKind::CanPlayThrough => player.can_play = true,
                    MediaEventKind::Started => player.is_playing = true,
                    MediaEventKind::Ended => player.is_playing = false,
                }
                return;
            }
        }
    }

    /// Number of player units currently allocated for a sound index.
    pub fn pool_size(&self, index: usize) -> usize {
        self.pools
            .get(index)
            .and_then(|p| p.as_ref())
            .map_or(0, |p| p.players.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records backend calls; never readies or finishes players by itself.
    #[derive(Default)]
    struct ScriptedMedia {
        created: Vec<String>,
        rates: Vec<(PlayerId, f64)>,
        pans: Vec<(PlayerId, f32)>,
        played: Vec<PlayerId>,
    }

    impl Media for ScriptedMedia {
        fn create_player(&mut self, url: &str) -> PlayerId {
            self.created.push(url.to_string());
            PlayerId(self.created.len() as u32 - 1)
        }

        fn set_rate(&mut self, player: PlayerId, rate: f64) {
            self.rates.push((player, rate));
        }

        fn set_pan(&mut self, player: PlayerId, pan: f32) {
            self.pans.push((player, pan));
        }

        fn play(&mut self, player: PlayerId) {
            self.played.push(player);
        }

        fn poll_events(&mut self) -> Vec<MediaEvent> {
            Vec::new()
        }

        fn render(&mut self, _out: &mut [f32], _sample_rate: u32) {}
    }

    fn bank() -> SoundBank {
        let mut bank = SoundBank::new();
        bank.add("sounds/pop.mp3", 3);
        bank
    }

    fn ready(sampler: &mut Sampler, player: PlayerId) {
        sampler.handle_event(&MediaEvent { player, kind: MediaEventKind::CanPlayThrough });
    }

    #[test]
    fn unknown_index_is_dropped() {
        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), false);
        sampler.play(&mut media, 9, 1.0, None);
        assert!(media.created.is_empty());
        assert!(media.played.is_empty());
    }

    #[test]
    fn first_play_creates_pool_lazily() {
        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), false);

        assert_eq!(sampler.pool_size(0), 0);
        sampler.play(&mut media, 0, 1.0, None);
        // One player created for the pool; not ready yet, so the request was
        // dropped and the pool grew by one.
        assert_eq!(media.created, vec!["sounds/pop.mp3", "sounds/pop.mp3"]);
        assert!(media.played.is_empty());
    }

    #[test]
    fn ready_idle_player_gets_the_request() {
        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), false);

        sampler.play(&mut media, 0, 1.0, None);
        ready(&mut sampler, PlayerId(0));

        sampler.play(&mut media, 0, 1.5, None);
        assert_eq!(media.played, vec![PlayerId(0)]);
        assert_eq!(media.rates.last(), Some(&(PlayerId(0), 1.5)));
    }

    #[test]
    fn busy_pool_drops_until_a_player_ends() {
        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), false);

        sampler.play(&mut media, 0, 1.0, None); // creates players 0,1
        for p in [PlayerId(0), PlayerId(1)] {
            ready(&mut sampler, p);
            sampler.handle_event(&MediaEvent { player: p, kind: MediaEventKind::Started });
        }
        ready(&mut sampler, PlayerId(2)); // not yet created; ignored

        // All allocated players busy: drop, grow to 3 (the cap).
        sampler.play(&mut media, 0, 1.0, None);
        assert!(media.played.is_empty());
        assert_eq!(sampler.pool_size(0), 3);

        // Third player still unready, so one more request drops without growth.
        sampler.play(&mut media, 0, 1.0, None);
        assert!(media.played.is_empty());
        assert_eq!(sampler.pool_size(0), 3);

        // A completion frees player 1; the next request lands on it.
        sampler.handle_event(&MediaEvent { player: PlayerId(1), kind: MediaEventKind::Ended });
        sampler.play(&mut media, 0, 2.0, None);
        assert_eq!(media.played, vec![PlayerId(1)]);
    }

    #[test]
    fn growth_stops_at_the_configured_maximum() {
        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), false);

        // Three exhaustion events: 1 player after creation, then +1 per drop,
        // capped at 3.
        sampler.play(&mut media, 0, 1.0, None);
        assert_eq!(sampler.pool_size(0), 2);
        sampler.play(&mut media, 0, 1.0, None);
        assert_eq!(sampler.pool_size(0), 3);
        sampler.play(&mut media, 0, 1.0, None);
        assert_eq!(sampler.pool_size(0), 3);
    }

    #[test]
    fn pan_is_applied_only_in_the_spatial_variant() {
        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), false);
        sampler.play(&mut media, 0, 1.0, Some(-0.5));
        ready(&mut sampler, PlayerId(0));
        sampler.play(&mut media, 0, 1.0, Some(-0.5));
        assert!(media.pans.is_empty());

        let mut media = ScriptedMedia::default();
        let mut sampler = Sampler::new(bank(), true);
        sampler.play(&mut media, 0, 1.0, Some(-0.5));
        ready(&mut sampler, PlayerId(0));
        sampler.play(&mut media, 0, 1.0, Some(-0.5));
        assert_eq!(media.pans, vec![(PlayerId(0), -0.5)]);
    }
}
