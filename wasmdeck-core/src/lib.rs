//! wasmdeck-core: a host runtime that bridges a WASM guest app to platform
//! capabilities it cannot reach on its own.
//!
//! The deck loads a guest module (WASM or WAT) and wires up two kinds of
//! adapters:
//!
//! - **Per-frame sync drivers** copy live host state (gamepad, pointer
//!   position) into raw memory regions the guest owns, at offsets the guest
//!   disclosed through exported accessor functions.
//! - **Synchronous host imports** let the guest pull data or trigger effects
//!   on demand: set the cursor shape, query a mouse position, pull size/DPR
//!   info, play sounds, press and release synth notes.
//!
//! Required guest export:
//! - `deck_frame()`
//!
//! Optional guest exports:
//! - `deck_init()`
//! - input-region accessors (see `crate::abi::guest_exports`); a guest that
//!   omits a region's accessors does without that sync driver.
//!
//! The embedder supplies the platform behind the traits in [`host`] and a
//! media backend from [`audio::media`], then calls [`Deck::run_frame`] once
//! per animation frame and [`Deck::render_audio`] from its audio pump.

pub mod abi;
pub mod audio;
pub mod bridge;
pub mod host;
pub mod loader;
pub mod mem;
pub mod runtime;
pub mod state;
pub mod sync;

use audio::AudioSystem;
use audio::media::Media;
use host::{InputSource, Surface, SurfaceEvent};
use mem::WasmMemory;
use runtime::Runtime;
use state::HostState;
use sync::gamepad::GamepadSync;
use sync::pointer::PointerSync;
use sync::resize::DprWatcher;

pub use audio::AudioConfig;
pub use audio::sampler::SoundBank;
pub use audio::synth::Waveform;

/// Which gamepad region layout to bind when the guest exports both families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutPreference {
    /// Interleaved if available, else named.
    #[default]
    Auto,
    Interleaved,
    Named,
}

/// Deck-level configuration. Plain data with usable defaults.
#[derive(Clone, Debug)]
pub struct DeckConfig {
    pub layout_preference: LayoutPreference,
    /// Convert the synced pointer position to a bottom-left origin.
    pub flip_pointer_y: bool,
    pub audio: AudioConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            layout_preference: LayoutPreference::Auto,
            flip_pointer_y: true,
            audio: AudioConfig::default(),
        }
    }
}

/// The host runtime instance: one loaded guest plus its adapters.
pub struct Deck {
    runtime: Runtime,
    instance: wasmtime::Instance,
    entrypoints: abi::GuestEntrypoints,
    memory: wasmtime::Memory,
    gamepad: Option<GamepadSync>,
    pointer: Option<PointerSync>,
    dpr: DprWatcher,
}

impl Deck {
    /// Compile and instantiate a guest (`.wasm` binary or `.wat` text),
    /// resolve its disclosed input-region layouts, and call `deck_init` if
    /// the guest exports it.
    pub fn load(
        guest_bytes: &[u8],
        config: DeckConfig,
        input: Box<dyn InputSource>,
        surface: Box<dyn Surface>,
        media: Box<dyn Media>,
    ) -> anyhow::Result<Self> {
        let audio = AudioSystem::new(config.audio.clone(), media);
        let mut runtime = Runtime::new(HostState::new(input, surface, audio))?;
        runtime.define_imports()?;

        let module = loader::compile_module(&runtime.engine, guest_bytes)?;
        let (instance, entrypoints, memory) = runtime.instantiate(&module)?;

        let layout = match config.layout_preference {
            LayoutPreference::Auto => {
                abi::resolve_interleaved_layout(&instance, &mut runtime.store)
                    .or_else(|| abi::resolve_named_layout(&instance, &mut runtime.store))
            }
            LayoutPreference::Interleaved => {
                abi::resolve_interleaved_layout(&instance, &mut runtime.store)
            }
            LayoutPreference::Named => abi::resolve_named_layout(&instance, &mut runtime.store),
        };
        let gamepad = match layout {
            Some(layout) => Some(GamepadSync::new(layout)),
            None => {
                log::warn!("gamepad sync disabled: guest exports no pad layout accessors");
                None
            }
        };

        let pointer = match abi::resolve_pointer_layout(&instance, &mut runtime.store) {
            Some(layout) => Some(PointerSync::new(layout, config.flip_pointer_y)),
            None => {
                log::warn!("pointer sync disabled: guest exports no pointer region accessors");
                None
            }
        };

        let dpr = DprWatcher::new(runtime.store.data_mut().surface.as_mut());

        if let Some(init) = &entrypoints.init {
            init.call(&mut runtime.store, ())?;
        }

        Ok(Self { runtime, instance, entrypoints, memory, gamepad, pointer, dpr })
    }

    /// Run one frame: drain surface events, run the sync drivers, pump media
    /// events, then call the guest's `deck_frame`.
    pub fn run_frame(&mut self) -> anyhow::Result<()> {
        for event in self.runtime.store.data_mut().surface.poll_events() {
            match event {
                SurfaceEvent::PointerMoved { client_x, client_y } => {
                    if let Some(pointer) = &mut self.pointer {
                        let view = self.runtime.store.data().surface.view();
                        pointer.on_pointer_moved(&view, client_x, client_y);
                    }
                }
                SurfaceEvent::PixelRatioChanged(ratio) => {
                    self.dpr
                        .on_ratio_changed(self.runtime.store.data_mut().surface.as_mut(), ratio);
                }
            }
        }

        if let Some(gamepad) = &mut self.gamepad {
            let pads = self.runtime.store.data_mut().input.gamepads();
            let mut mem = WasmMemory::new(self.memory, &mut self.runtime.store);
            gamepad.step(&mut mem, &pads)?;
        }

        if let Some(pointer) = &self.pointer {
            let mut mem = WasmMemory::new(self.memory, &mut self.runtime.store);
            pointer.step(&mut mem)?;
        }

        self.runtime.store.data_mut().audio.pump_media_events();

        self.entrypoints.frame.call(&mut self.runtime.store, ())?;
        Ok(())
    }

    /// Fill `out` (interleaved stereo f32) from the audio subsystem.
    pub fn render_audio(&mut self, out: &mut [f32]) {
        self.runtime.store.data_mut().audio.render(out);
    }

    pub fn state(&self) -> &HostState {
        self.runtime.store.data()
    }

    pub fn state_mut(&mut self) -> &mut HostState {
        self.runtime.store.data_mut()
    }

    pub fn instance(&self) -> &wasmtime::Instance {
        &self.instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::media::BufferMedia;
    use crate::host::{GamepadButton, GamepadSnapshot, HeadlessInput, HeadlessSurface, Rect,
                      SurfaceView};
    use crate::mem::GuestMemory;

    fn test_view() -> SurfaceView {
        SurfaceView {
            rect: Rect { left: 0.0, top: 0.0, right: 320.0, bottom: 240.0 },
            width: 320,
            height: 240,
        }
    }

    fn load_deck(
        wat: &str,
        config: DeckConfig,
    ) -> (Deck, HeadlessInput, HeadlessSurface) {
        let _ = env_logger::builder().is_test(true).try_init();
        let input = HeadlessInput::new();
        let surface = HeadlessSurface::new("canvas-1", test_view());
        let deck = Deck::load(
            wat.as_bytes(),
            config,
            Box::new(input.clone()),
            Box::new(surface.clone()),
            Box::new(BufferMedia::new()),
        )
        .expect("deck load failed");
        (deck, input, surface)
    }

    const GAMEPAD_GUEST: &str = r#"
        (module
          (memory (export "memory") 1)
          (func (export "deck_frame"))
          (func (export "gamepad_alloc") (result i32) i32.const 1024)
          (func (export "gamepad_connected_offset") (result i32) i32.const 0)
          (func (export "gamepad_buttons_offset") (result i32) i32.const 8)
          (func (export "gamepad_axes_offset") (result i32) i32.const 160)
          (func (export "gamepad_button_size") (result i32) i32.const 8)
          (func (export "gamepad_button_pressed_offset") (result i32) i32.const 0)
          (func (export "gamepad_button_touched_offset") (result i32) i32.const 1)
          (func (export "gamepad_button_value_offset") (result i32) i32.const 4)
          (func (export "mouse_pos_alloc") (result i32) i32.const 512)
          (func (export "mouse_pos_x_offset") (result i32) i32.const 0)
          (func (export "mouse_pos_y_offset") (result i32) i32.const 4)
        )
    "#;

    #[test]
    fn frame_sync_writes_snapshot_into_guest_memory() {
        let (mut deck, input, surface) = load_deck(GAMEPAD_GUEST, DeckConfig::default());

        input.set_gamepads(vec![Some(GamepadSnapshot {
            id: "Test Pad".to_string(),
            buttons: vec![GamepadButton { pressed: true, touched: true, value: 1.0 }],
            axes: vec![0.5, -0.5],
        })]);
        surface.push_pointer(80.0, 60.0);

        deck.run_frame().unwrap();

        let mut mem = WasmMemory::new(deck.memory, &mut deck.runtime.store);
        assert_eq!(mem.load_u8(1024).unwrap(), 1, "connected");
        assert_eq!(mem.load_u8(1024 + 8).unwrap(), 1, "pressed");
        assert_eq!(mem.load_u8(1024 + 9).unwrap(), 1, "touched");
        assert_eq!(mem.load_f32(1024 + 12).unwrap(), 1.0, "value");
        assert_eq!(mem.load_f32(1024 + 160).unwrap(), 0.5, "axis 0");
        assert_eq!(mem.load_f32(1024 + 164).unwrap(), -0.5, "axis 1");
        assert_eq!(mem.load_f32(512).unwrap(), 80.0, "pointer x");
        assert_eq!(mem.load_f32(516).unwrap(), 180.0, "pointer y, bottom-left origin");
    }

    #[test]
    fn disconnect_clears_flag_but_keeps_stale_fields() {
        let (mut deck, input, _surface) = load_deck(GAMEPAD_GUEST, DeckConfig::default());

        input.set_gamepads(vec![Some(GamepadSnapshot {
            id: "Test Pad".to_string(),
            buttons: vec![GamepadButton { pressed: true, touched: false, value: 1.0 }],
            axes: vec![0.5],
        })]);
        deck.run_frame().unwrap();

        input.set_gamepads(vec![]);
        deck.run_frame().unwrap();

        let mut mem = WasmMemory::new(deck.memory, &mut deck.runtime.store);
        assert_eq!(mem.load_u8(1024).unwrap(), 0);
        assert_eq!(mem.load_u8(1024 + 8).unwrap(), 1, "stale pressed byte");
        assert_eq!(mem.load_f32(1024 + 160).unwrap(), 0.5, "stale axis");
    }

    const CALL_IN_GUEST: &str = r#"
        (module
          (import "deck_sound" "note_pressed" (func $note_pressed (param i32 f64)))
          (import "deck_cursor" "set_cursor" (func $set_cursor (param i32)))
          (memory (export "memory") 1)
          (func (export "deck_frame")
            i32.const 5
            f64.const 440
            call $note_pressed
            i32.const 5
            call $set_cursor)
        )
    "#;

    #[test]
    fn guest_call_ins_reach_audio_and_cursor() {
        let (mut deck, _input, surface) = load_deck(CALL_IN_GUEST, DeckConfig::default());

        deck.run_frame().unwrap();
        deck.run_frame().unwrap();

        let audio = &deck.state().audio;
        assert!(audio.is_live());
        let synth = audio.synth().unwrap();
        assert_eq!(synth.created_count(), 1, "two presses share one generator");
        assert!(synth.voice(5).unwrap().pressed());
        assert_eq!(surface.cursor(), "pointer");
    }

    const QUERY_GUEST: &str = r#"
        (module
          (import "deck_mouse" "get_mouse_pos" (func $get_mouse_pos (param i32 i32 i32 f64 f64 i32)))
          (import "deck_resize" "update_size_info" (func $update_size_info (param i32)))
          (memory (export "memory") 1)
          (data (i32.const 64) "canvas-1")
          (func (export "deck_frame")
            i32.const 256
            i32.const 64
            i32.const 8
            f64.const 80
            f64.const 60
            i32.const 1
            call $get_mouse_pos
            i32.const 512
            call $update_size_info)
        )
    "#;

    #[test]
    fn mouse_query_and_size_info_round_trip() {
        let (mut deck, _input, surface) = load_deck(QUERY_GUEST, DeckConfig::default());
        surface.set_window_inner_size(1280.0, 720.0);
        surface.set_pixel_ratio(2.0);

        deck.run_frame().unwrap();

        let mut mem = WasmMemory::new(deck.memory, &mut deck.runtime.store);
        let pos = mem.load_f64_array(256, 2).unwrap();
        assert_eq!(pos, vec![80.0, 180.0], "flipped y");

        let info = mem.load_f64_array(512, 7).unwrap();
        assert_eq!(info, vec![1280.0, 720.0, 320.0, 240.0, 0.0, 0.0, 2.0]);
        assert_eq!(surface.backing_size(), (640, 480), "backing follows rect * dpr");
        // The pixel-ratio watch was renewed at the new ratio.
        assert_eq!(surface.watched_ratios(), vec![2.0]);
    }

    const BARE_GUEST: &str = r#"
        (module
          (memory (export "memory") 1)
          (func (export "deck_frame"))
        )
    "#;

    #[test]
    fn missing_region_accessors_disable_drivers_without_failing() {
        let (mut deck, input, _surface) = load_deck(BARE_GUEST, DeckConfig::default());
        assert!(deck.gamepad.is_none());
        assert!(deck.pointer.is_none());

        input.set_gamepads(vec![Some(GamepadSnapshot::default())]);
        deck.run_frame().unwrap();
        deck.run_frame().unwrap();
    }

    #[test]
    fn guest_without_frame_export_fails_to_load() {
        let _ = env_logger::builder().is_test(true).try_init();
        let result = Deck::load(
            b"(module (memory (export \"memory\") 1))",
            DeckConfig::default(),
            Box::new(HeadlessInput::new()),
            Box::new(HeadlessSurface::new("canvas-1", test_view())),
            Box::new(BufferMedia::new()),
        );
        assert!(result.is_err());
    }
}
