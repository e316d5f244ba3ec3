//! Host-side shared state.
//!
//! Everything the synchronous host imports need lives here, carried as the
//! `wasmtime::Store` data so import closures reach it through
//! `Caller::data_mut`. The per-frame sync drivers live on the deck itself;
//! they pull what they need out of this state before touching guest memory.

use crate::audio::AudioSystem;
use crate::host::{InputSource, Surface};

pub struct HostState {
    pub input: Box<dyn InputSource>,
    pub surface: Box<dyn Surface>,
    pub audio: AudioSystem,
}

impl HostState {
    pub fn new(
        input: Box<dyn InputSource>,
        surface: Box<dyn Surface>,
        audio: AudioSystem,
    ) -> Self {
        Self { input, surface, audio }
    }
}
