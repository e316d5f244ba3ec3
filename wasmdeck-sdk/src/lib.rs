#![cfg_attr(not(feature = "std"), no_std)]

//! wasmdeck-sdk
//!
//! This crate is used by **guest** WASM apps that run under the `wasmdeck`
//! host runtime.
//!
//! Bridge model:
//! - The guest owns raw input regions in its linear memory and **discloses**
//!   their layout through exported accessor functions; the host writes the
//!   live device state into those regions once per frame.
//! - The guest calls host imports for on-demand effects and queries: cursor,
//!   mouse position, size info, sounds, synth notes.
//!
//! The region structs here ([`GamepadRegion`], [`NamedPadRegion`],
//! [`PointerRegion`]) pair with the `export_*_region!` macros, which emit the
//! accessor exports from the struct's actual field offsets, so the guest never
//! hand-maintains byte offsets.
//!
//! The guest must export `deck_frame()`; `deck_init()` is optional.

/// Buttons reserved in [`GamepadRegion`].
pub const MAX_BUTTONS: usize = 17;
/// Axes reserved in [`GamepadRegion`].
pub const MAX_AXES: usize = 4;

/// One button record in the interleaved gamepad region.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PadButton {
    pub pressed: u8,
    pub touched: u8,
    pub value: f32,
}

impl PadButton {
    pub const ZERO: PadButton = PadButton { pressed: 0, touched: 0, value: 0.0 };

    pub fn is_pressed(&self) -> bool {
        self.pressed != 0
    }

    pub fn is_touched(&self) -> bool {
        self.touched != 0
    }
}

/// Interleaved gamepad region: variable-stride button records plus packed
/// axis floats. The host fills it each frame; `connected` is 0/1.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GamepadRegion {
    pub connected: u8,
    pub buttons: [PadButton; MAX_BUTTONS],
    pub axes: [f32; MAX_AXES],
}

impl GamepadRegion {
    pub const ZERO: GamepadRegion = GamepadRegion {
        connected: 0,
        buttons: [PadButton::ZERO; MAX_BUTTONS],
        axes: [0.0; MAX_AXES],
    };

    pub fn is_connected(&self) -> bool {
        self.connected != 0
    }
}

/// Fixed-semantic gamepad region: face-button flags are 0/255 bytes, triggers
/// and sticks are named float slots.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct NamedPadRegion {
    pub connected: u8,
    pub south: u8,
    pub east: u8,
    pub west: u8,
    pub north: u8,
    pub trigger_left: f32,
    pub trigger_right: f32,
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
}

impl NamedPadRegion {
    pub const ZERO: NamedPadRegion = NamedPadRegion {
        connected: 0,
        south: 0,
        east: 0,
        west: 0,
        north: 0,
        trigger_left: 0.0,
        trigger_right: 0.0,
        left_x: 0.0,
        left_y: 0.0,
        right_x: 0.0,
        right_y: 0.0,
    };
}

/// Pointer region: normalized surface-space position, refreshed each frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct PointerRegion {
    pub x: f32,
    pub y: f32,
}

impl PointerRegion {
    pub const ZERO: PointerRegion = PointerRegion { x: 0.0, y: 0.0 };
}

/// Low-level raw ABI imports.
pub mod sys {
    #[link(wasm_import_module = "deck_cursor")]
    unsafe extern "C" {
        pub fn set_cursor(code: u32);
    }

    #[link(wasm_import_module = "deck_gamepad")]
    unsafe extern "C" {
        pub fn get_input(
            connected_ptr: u32,
            axes_ptr: u32,
            buttons_ptr: u32,
            button_size: u32,
            pressed_off: u32,
            touched_off: u32,
            value_off: u32,
        );
    }

    #[link(wasm_import_module = "deck_resize")]
    unsafe extern "C" {
        pub fn update_size_info(ptr: u32);
        pub fn scroll_offsets(ptr: u32);
    }

    #[link(wasm_import_module = "deck_mouse")]
    unsafe extern "C" {
        pub fn get_mouse_pos(
            out_ptr: u32,
            id_ptr: u32,
            id_len: u32,
            client_x: f64,
            client_y: f64,
            flip_y: u32,
        );
    }

    #[link(wasm_import_module = "deck_sound")]
    unsafe extern "C" {
        pub fn play_sound(index: u32, rate: f64);
        pub fn play_sound_panned(index: u32, rate: f64, pan: f64);
        pub fn set_volume(gain: f64);
        pub fn note_pressed(index: u32, freq: f64);
        pub fn note_released(index: u32);
    }
}

/// Emit the accessor exports for an interleaved gamepad region static.
///
/// ```ignore
/// static mut GAMEPAD: GamepadRegion = GamepadRegion::ZERO;
/// wasmdeck_sdk::export_gamepad_region!(GAMEPAD);
/// ```
#[macro_export]
macro_rules! export_gamepad_region {
    ($region:ident) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_alloc() -> u32 {
            unsafe { core::ptr::addr_of!($region) as u32 }
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_connected_offset() -> u32 {
            core::mem::offset_of!($crate::GamepadRegion, connected) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_buttons_offset() -> u32 {
            core::mem::offset_of!($crate::GamepadRegion, buttons) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_axes_offset() -> u32 {
            core::mem::offset_of!($crate::GamepadRegion, axes) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_button_size() -> u32 {
            core::mem::size_of::<$crate::PadButton>() as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_button_pressed_offset() -> u32 {
            core::mem::offset_of!($crate::PadButton, pressed) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_button_touched_offset() -> u32 {
            core::mem::offset_of!($crate::PadButton, touched) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_button_value_offset() -> u32 {
            core::mem::offset_of!($crate::PadButton, value) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_button_count() -> u32 {
            $crate::MAX_BUTTONS as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn gamepad_axis_count() -> u32 {
            $crate::MAX_AXES as u32
        }
    };
}

/// Emit the accessor exports for a named gamepad region static.
#[macro_export]
macro_rules! export_named_pad_region {
    ($region:ident) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_alloc() -> u32 {
            unsafe { core::ptr::addr_of!($region) as u32 }
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_connected_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, connected) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_south_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, south) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_east_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, east) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_west_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, west) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_north_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, north) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_lt_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, trigger_left) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_rt_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, trigger_right) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_lx_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, left_x) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_ly_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, left_y) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_rx_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, right_x) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn pad_ry_offset() -> u32 {
            core::mem::offset_of!($crate::NamedPadRegion, right_y) as u32
        }
    };
}

/// Emit the accessor exports for a pointer region static.
#[macro_export]
macro_rules! export_pointer_region {
    ($region:ident) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn mouse_pos_alloc() -> u32 {
            unsafe { core::ptr::addr_of!($region) as u32 }
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn mouse_pos_x_offset() -> u32 {
            core::mem::offset_of!($crate::PointerRegion, x) as u32
        }
        #[unsafe(no_mangle)]
        pub extern "C" fn mouse_pos_y_offset() -> u32 {
            core::mem::offset_of!($crate::PointerRegion, y) as u32
        }
    };
}

/// Cursor API.
pub mod cursor {
    use super::sys;

    /// Cursor shapes understood by the host; mirrors its lookup table.
    /// Codes outside the table fall back to `Default` on the host side.
    #[repr(u32)]
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub enum Cursor {
        Auto = 0,
        Default = 1,
        None = 2,
        ContextMenu = 3,
        Help = 4,
        Pointer = 5,
        Progress = 6,
        Wait = 7,
        Cell = 8,
        Crosshair = 9,
        Text = 10,
        VerticalText = 11,
        Alias = 12,
        Copy = 13,
        Move = 14,
        NoDrop = 15,
        NotAllowed = 16,
        Grab = 17,
        Grabbing = 18,
        EResize = 19,
        NResize = 20,
        NeResize = 21,
        NwResize = 22,
        SResize = 23,
        SeResize = 24,
        SwResize = 25,
        WResize = 26,
        EwResize = 27,
        NsResize = 28,
        NeswResize = 29,
        NwseResize = 30,
        ColResize = 31,
        RowResize = 32,
        AllScroll = 33,
        ZoomIn = 34,
        ZoomOut = 35,
    }

    /// Set the surface cursor shape.
    pub fn set(cursor: Cursor) {
        unsafe { sys::set_cursor(cursor as u32) }
    }

    /// Set the cursor by raw code.
    pub fn set_raw(code: u32) {
        unsafe { sys::set_cursor(code) }
    }
}

/// Pull-style gamepad API (an alternative to the per-frame synced region).
pub mod gamepad {
    use super::{MAX_AXES, MAX_BUTTONS, PadButton, sys};

    /// Scratch buffer filled by [`pull`].
    #[repr(C)]
    #[derive(Copy, Clone, Debug)]
    pub struct Snapshot {
        pub connected: u8,
        pub axes: [f64; MAX_AXES],
        pub buttons: [PadButton; MAX_BUTTONS],
    }

    impl Snapshot {
        pub const ZERO: Snapshot = Snapshot {
            connected: 0,
            axes: [0.0; MAX_AXES],
            buttons: [PadButton::ZERO; MAX_BUTTONS],
        };
    }

    /// Pull the latest gamepad state into `out` right now.
    pub fn pull(out: &mut Snapshot) {
        unsafe {
            sys::get_input(
                core::ptr::addr_of_mut!(out.connected) as u32,
                core::ptr::addr_of_mut!(out.axes) as u32,
                core::ptr::addr_of_mut!(out.buttons) as u32,
                core::mem::size_of::<PadButton>() as u32,
                core::mem::offset_of!(PadButton, pressed) as u32,
                core::mem::offset_of!(PadButton, touched) as u32,
                core::mem::offset_of!(PadButton, value) as u32,
            )
        }
    }
}

/// Mouse API.
pub mod mouse {
    use super::sys;

    /// Normalize explicit client coordinates into the pixel space of the
    /// surface element named by `canvas_id`.
    pub fn position(canvas_id: &str, client_x: f64, client_y: f64, flip_y: bool) -> (f64, f64) {
        let mut out = [0f64; 2];
        unsafe {
            sys::get_mouse_pos(
                out.as_mut_ptr() as u32,
                canvas_id.as_ptr() as u32,
                canvas_id.len() as u32,
                client_x,
                client_y,
                flip_y as u32,
            )
        }
        (out[0], out[1])
    }
}

/// Window/surface size API.
pub mod resize {
    use super::sys;

    /// The size-info tuple, in host write order.
    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default)]
    pub struct SizeInfo {
        pub window_width: f64,
        pub window_height: f64,
        pub rect_width: f64,
        pub rect_height: f64,
        pub rect_left: f64,
        pub rect_top: f64,
        pub pixel_ratio: f64,
    }

    /// Pull current window/surface sizes and the device pixel ratio. The
    /// host also refreshes the surface backing resolution as part of this.
    pub fn size_info() -> SizeInfo {
        let mut out = [0f64; 7];
        unsafe { sys::update_size_info(out.as_mut_ptr() as u32) }
        SizeInfo {
            window_width: out[0],
            window_height: out[1],
            rect_width: out[2],
            rect_height: out[3],
            rect_left: out[4],
            rect_top: out[5],
            pixel_ratio: out[6],
        }
    }

    /// Pull current scroll offsets.
    pub fn scroll_offsets() -> (f64, f64) {
        let mut out = [0f64; 2];
        unsafe { sys::scroll_offsets(out.as_mut_ptr() as u32) }
        (out[0], out[1])
    }
}

/// Sound API.
pub mod sound {
    use super::sys;

    /// Play sound `index` at a playback rate (1.0 = natural pitch).
    pub fn play(index: u32, rate: f64) {
        unsafe { sys::play_sound(index, rate) }
    }

    /// Play sound `index` with a stereo pan position in `-1.0..=1.0`.
    pub fn play_panned(index: u32, rate: f64, pan: f64) {
        unsafe { sys::play_sound_panned(index, rate, pan) }
    }

    /// Set the master gain.
    pub fn set_volume(gain: f64) {
        unsafe { sys::set_volume(gain) }
    }

    /// Begin (or retrigger) the synth voice at `index` with frequency `freq`.
    pub fn note_pressed(index: u32, freq: f64) {
        unsafe { sys::note_pressed(index, freq) }
    }

    /// Release the synth voice at `index`.
    pub fn note_released(index: u32) {
        unsafe { sys::note_released(index) }
    }
}

/// Convenience prelude for guest apps.
pub mod prelude {
    pub use crate::cursor::{self, Cursor};
    pub use crate::gamepad;
    pub use crate::mouse;
    pub use crate::resize;
    pub use crate::sound;
    pub use crate::{GamepadRegion, NamedPadRegion, PadButton, PointerRegion};
}
