//! wasmdeck ABI.
//!
//! Single source of truth for the contract between:
//! - **Host**: `wasmdeck-core` (this crate)
//! - **Guest**: the loaded WASM module
//!
//! ## Imports (guest -> host)
//! Grouped by capability module:
//!
//! - `deck_cursor.set_cursor(code: u32)`
//! - `deck_gamepad.get_input(connected_ptr, axes_ptr, buttons_ptr,
//!   button_size, pressed_off, touched_off, value_off)`: pull the latest
//!   snapshot into caller-specified addresses.
//! - `deck_resize.update_size_info(ptr: u32)`: 7 f64 values, see
//!   `crate::sync::resize`. `deck_resize.scroll_offsets(ptr: u32)`: 2 f64.
//! - `deck_mouse.get_mouse_pos(out_ptr, id_ptr, id_len, client_x: f64,
//!   client_y: f64, flip_y)`: 2 f64 at `out_ptr`.
//! - `deck_sound.play_sound(index, rate: f64)`,
//!   `play_sound_panned(index, rate: f64, pan: f64)`,
//!   `set_volume(gain: f64)`, `note_pressed(index, freq: f64)`,
//!   `note_released(index)`.
//!
//! ## Exports (host -> guest)
//! The guest must export `deck_frame()` and its linear `memory`; `deck_init()`
//! is optional. Input-sync regions are disclosed through the accessor exports
//! named in [`guest_exports`]: an `*_alloc` function returning the region base
//! plus one `*_offset` function per field (and a size accessor for the
//! variable-stride button records). A guest that omits a region's accessors
//! simply does not get that sync driver.

use wasmtime::{Instance, Store, TypedFunc};

use crate::sync::gamepad::{
    DEFAULT_AXIS_COUNT, DEFAULT_BUTTON_COUNT, InterleavedLayout, NamedLayout, PadLayout,
};
use crate::sync::pointer::PointerLayout;

/// Import module names, one per capability.
pub mod import_modules {
    pub const CURSOR: &str = "deck_cursor";
    pub const GAMEPAD: &str = "deck_gamepad";
    pub const RESIZE: &str = "deck_resize";
    pub const MOUSE: &str = "deck_mouse";
    pub const SOUND: &str = "deck_sound";
}

/// Host import names under the modules in [`import_modules`].
pub mod host_imports {
    pub const SET_CURSOR: &str = "set_cursor";
    pub const GET_INPUT: &str = "get_input";
    pub const UPDATE_SIZE_INFO: &str = "update_size_info";
    pub const SCROLL_OFFSETS: &str = "scroll_offsets";
    pub const GET_MOUSE_POS: &str = "get_mouse_pos";
    pub const PLAY_SOUND: &str = "play_sound";
    pub const PLAY_SOUND_PANNED: &str = "play_sound_panned";
    pub const SET_VOLUME: &str = "set_volume";
    pub const NOTE_PRESSED: &str = "note_pressed";
    pub const NOTE_RELEASED: &str = "note_released";
}

/// Guest export names.
pub mod guest_exports {
    /// Called once after instantiation (optional).
    pub const INIT: &str = "deck_init";
    /// Called once per frame after the sync drivers (required).
    pub const FRAME: &str = "deck_frame";

    // Interleaved gamepad region.
    pub const GAMEPAD_ALLOC: &str = "gamepad_alloc";
    pub const GAMEPAD_CONNECTED_OFFSET: &str = "gamepad_connected_offset";
    pub const GAMEPAD_BUTTONS_OFFSET: &str = "gamepad_buttons_offset";
    pub const GAMEPAD_AXES_OFFSET: &str = "gamepad_axes_offset";
    pub const GAMEPAD_BUTTON_SIZE: &str = "gamepad_button_size";
    pub const GAMEPAD_BUTTON_PRESSED_OFFSET: &str = "gamepad_button_pressed_offset";
    pub const GAMEPAD_BUTTON_TOUCHED_OFFSET: &str = "gamepad_button_touched_offset";
    pub const GAMEPAD_BUTTON_VALUE_OFFSET: &str = "gamepad_button_value_offset";
    /// Optional overrides for the reserved record counts.
    pub const GAMEPAD_BUTTON_COUNT: &str = "gamepad_button_count";
    pub const GAMEPAD_AXIS_COUNT: &str = "gamepad_axis_count";

    // Named (fixed-semantic) gamepad region.
    pub const PAD_ALLOC: &str = "pad_alloc";
    pub const PAD_CONNECTED_OFFSET: &str = "pad_connected_offset";
    pub const PAD_SOUTH_OFFSET: &str = "pad_south_offset";
    pub const PAD_EAST_OFFSET: &str = "pad_east_offset";
    pub const PAD_WEST_OFFSET: &str = "pad_west_offset";
    pub const PAD_NORTH_OFFSET: &str = "pad_north_offset";
    pub const PAD_LT_OFFSET: &str = "pad_lt_offset";
    pub const PAD_RT_OFFSET: &str = "pad_rt_offset";
    pub const PAD_LX_OFFSET: &str = "pad_lx_offset";
    pub const PAD_LY_OFFSET: &str = "pad_ly_offset";
    pub const PAD_RX_OFFSET: &str = "pad_rx_offset";
    pub const PAD_RY_OFFSET: &str = "pad_ry_offset";

    // Pointer region.
    pub const MOUSE_POS_ALLOC: &str = "mouse_pos_alloc";
    pub const MOUSE_POS_X_OFFSET: &str = "mouse_pos_x_offset";
    pub const MOUSE_POS_Y_OFFSET: &str = "mouse_pos_y_offset";
}

/// Resolved guest entrypoints, called by the deck each frame.
pub struct GuestEntrypoints {
    pub init: Option<TypedFunc<(), ()>>,
    pub frame: TypedFunc<(), ()>,
}

impl GuestEntrypoints {
    pub fn resolve<T>(instance: &Instance, store: &mut Store<T>) -> anyhow::Result<Self> {
        let frame = instance
            .get_typed_func::<(), ()>(&mut *store, guest_exports::FRAME)
            .map_err(|_| anyhow::anyhow!("guest missing required export `{}`", guest_exports::FRAME))?;
        let init = instance
            .get_typed_func::<(), ()>(&mut *store, guest_exports::INIT)
            .ok();
        Ok(Self { init, frame })
    }
}

/// Call a `() -> u32` accessor export, if the guest provides it.
pub fn call_accessor<T>(instance: &Instance, store: &mut Store<T>, name: &str) -> Option<u32> {
    let func = instance.get_typed_func::<(), u32>(&mut *store, name).ok()?;
    func.call(&mut *store, ()).ok()
}

/// Resolve the interleaved gamepad layout, if its accessors are exported.
pub fn resolve_interleaved_layout<T>(
    instance: &Instance,
    store: &mut Store<T>,
) -> Option<PadLayout> {
    use guest_exports as ge;
    let base = call_accessor(instance, store, ge::GAMEPAD_ALLOC)?;
    Some(PadLayout::Interleaved(InterleavedLayout {
        base,
        connected: call_accessor(instance, store, ge::GAMEPAD_CONNECTED_OFFSET)?,
        buttons: call_accessor(instance, store, ge::GAMEPAD_BUTTONS_OFFSET)?,
        axes: call_accessor(instance, store, ge::GAMEPAD_AXES_OFFSET)?,
        button_stride: call_accessor(instance, store, ge::GAMEPAD_BUTTON_SIZE)?,
        pressed: call_accessor(instance, store, ge::GAMEPAD_BUTTON_PRESSED_OFFSET)?,
        touched: call_accessor(instance, store, ge::GAMEPAD_BUTTON_TOUCHED_OFFSET)?,
        value: call_accessor(instance, store, ge::GAMEPAD_BUTTON_VALUE_OFFSET)?,
        button_count: call_accessor(instance, store, ge::GAMEPAD_BUTTON_COUNT)
            .map_or(DEFAULT_BUTTON_COUNT, |n| n as usize),
        axis_count: call_accessor(instance, store, ge::GAMEPAD_AXIS_COUNT)
            .map_or(DEFAULT_AXIS_COUNT, |n| n as usize),
    }))
}

/// Resolve the named gamepad layout, if its accessors are exported.
pub fn resolve_named_layout<T>(instance: &Instance, store: &mut Store<T>) -> Option<PadLayout> {
    use guest_exports as ge;
    let base = call_accessor(instance, store, ge::PAD_ALLOC)?;
    Some(PadLayout::Named(NamedLayout {
        base,
        connected: call_accessor(instance, store, ge::PAD_CONNECTED_OFFSET)?,
        south: call_accessor(instance, store, ge::PAD_SOUTH_OFFSET)?,
        east: call_accessor(instance, store, ge::PAD_EAST_OFFSET)?,
        west: call_accessor(instance, store, ge::PAD_WEST_OFFSET)?,
        north: call_accessor(instance, store, ge::PAD_NORTH_OFFSET)?,
        trigger_left: call_accessor(instance, store, ge::PAD_LT_OFFSET)?,
        trigger_right: call_accessor(instance, store, ge::PAD_RT_OFFSET)?,
        left_x: call_accessor(instance, store, ge::PAD_LX_OFFSET)?,
        left_y: call_accessor(instance, store, ge::PAD_LY_OFFSET)?,
        right_x: call_accessor(instance, store, ge::PAD_RX_OFFSET)?,
        right_y: call_accessor(instance, store, ge::PAD_RY_OFFSET)?,
    }))
}

/// Resolve the pointer region layout, if its accessors are exported.
pub fn resolve_pointer_layout<T>(
    instance: &Instance,
    store: &mut Store<T>,
) -> Option<PointerLayout> {
    use guest_exports as ge;
    Some(PointerLayout {
        base: call_accessor(instance, store, ge::MOUSE_POS_ALLOC)?,
        x: call_accessor(instance, store, ge::MOUSE_POS_X_OFFSET)?,
        y: call_accessor(instance, store, ge::MOUSE_POS_Y_OFFSET)?,
    })
}
