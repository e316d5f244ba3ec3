//! Gamepad state sync.
//!
//! Copies the first connected gamepad of the frame's device snapshot into the
//! guest's pad region. Exactly one gamepad is supported; other slots are
//! ignored. The connected flag is written before the scan so "no gamepad" is
//! the default. When nothing is connected the driver stops there;
//! button/axis fields keep whatever they held last.
//!
//! Two mutually incompatible region layouts exist; which one is active is
//! decided at load time from the accessor exports the guest provides.

use crate::host::{GamepadButton, GamepadSnapshot};
use crate::mem::{GuestMemory, MemoryError};

/// Buttons reserved by default when the guest does not say otherwise.
pub const DEFAULT_BUTTON_COUNT: usize = 17;
/// Axes reserved by default.
pub const DEFAULT_AXIS_COUNT: usize = 4;

// Fixed button/axis meanings for the named layout (standard pad mapping).
pub const BUTTON_SOUTH: usize = 0;
pub const BUTTON_EAST: usize = 1;
pub const BUTTON_WEST: usize = 2;
pub const BUTTON_NORTH: usize = 3;
pub const BUTTON_TRIGGER_LEFT: usize = 6;
pub const BUTTON_TRIGGER_RIGHT: usize = 7;
pub const AXIS_LEFT_X: usize = 0;
pub const AXIS_LEFT_Y: usize = 1;
pub const AXIS_RIGHT_X: usize = 2;
pub const AXIS_RIGHT_Y: usize = 3;

/// Variable-stride records: one `{pressed, touched, value}` record per
/// button, axes as a packed f32 array.
#[derive(Clone, Copy, Debug)]
pub struct InterleavedLayout {
    pub base: u32,
    pub connected: u32,
    pub buttons: u32,
    pub axes: u32,
    /// Bytes per button record.
    pub button_stride: u32,
    pub pressed: u32,
    pub touched: u32,
    pub value: u32,
    pub button_count: usize,
    pub axis_count: usize,
}

/// Fixed-semantic fields: face-button flags as 0/255 bytes, trigger values
/// and stick axes as named f32 slots.
#[derive(Clone, Copy, Debug)]
pub struct NamedLayout {
    pub base: u32,
    pub connected: u32,
    pub south: u32,
    pub east: u32,
    pub west: u32,
    pub north: u32,
    pub trigger_left: u32,
    pub trigger_right: u32,
    pub left_x: u32,
    pub left_y: u32,
    pub right_x: u32,
    pub right_y: u32,
}

#[derive(Clone, Copy, Debug)]
pub enum PadLayout {
    Interleaved(InterleavedLayout),
    Named(NamedLayout),
}

impl PadLayout {
    fn base_and_connected(&self) -> (u32, u32) {
        match self {
            PadLayout::Interleaved(l) => (l.base, l.connected),
            PadLayout::Named(l) => (l.base, l.connected),
        }
    }
}

/// Per-session driver state.
pub struct GamepadSync {
    layout: PadLayout,
    logged: bool,
}

impl GamepadSync {
    pub fn new(layout: PadLayout) -> Self {
        Self { layout, logged: false }
    }

    /// Run one sync against the frame's device snapshot.
    pub fn step(
        &mut self,
        mem: &mut dyn GuestMemory,
        pads: &[Option<GamepadSnapshot>],
    ) -> Result<(), MemoryError> {
        let (base, connected) = self.layout.base_and_connected();
        mem.store_u8(base + connected, 0)?;

        let Some(pad) = pads.iter().flatten().next() else {
            return Ok(());
        };
        mem.store_u8(base + connected, 1)?;

        if !self.logged {
            self.logged = true;
            log::info!(
                "gamepad connected: {} ({} buttons, {} axes)",
                pad.id,
                pad.buttons.len(),
                pad.axes.len()
            );
        }

        match self.layout {
            PadLayout::Interleaved(layout) => sync_interleaved(mem, &layout, pad),
            PadLayout::Named(layout) => sync_named(mem, &layout, pad),
        }
    }
}

fn sync_interleaved(
    mem: &mut dyn GuestMemory,
    layout: &InterleavedLayout,
    pad: &GamepadSnapshot,
) -> Result<(), MemoryError> {
    for (i, button) in pad.buttons.iter().take(layout.button_count).enumerate() {
        let record = layout.base + layout.buttons + i as u32 * layout.button_stride;
        mem.store_u8(record + layout.pressed, button.pressed as u8)?;
        mem.store_u8(record + layout.touched, button.touched as u8)?;
        mem.store_f32(record + layout.value, button.value as f32)?;
        if button.pressed || button.touched {
            log::trace!("btn[{i}]: {}", button.value);
        }
    }
    for (i, axis) in pad.axes.iter().take(layout.axis_count).enumerate() {
        mem.store_f32(layout.base + layout.axes + i as u32 * 4, *axis as f32)?;
    }
    Ok(())
}

fn flag_byte(button: Option<&GamepadButton>) -> Option<u8> {
    button.map(|b| if b.pressed { 0xFF } else { 0 })
}

fn sync_named(
    mem: &mut dyn GuestMemory,
    layout: &NamedLayout,
    pad: &GamepadSnapshot,
) -> Result<(), MemoryError> {
    let flags = [
        (layout.south, BUTTON_SOUTH),
        (layout.east, BUTTON_EAST),
        (layout.west, BUTTON_WEST),
        (layout.north, BUTTON_NORTH),
    ];
    for (offset, index) in flags {
        if let Some(byte) = flag_byte(pad.buttons.get(index)) {
            mem.store_u8(layout.base + offset, byte)?;
        }
    }

    let triggers = [
        (layout.trigger_left, BUTTON_TRIGGER_LEFT),
        (layout.trigger_right, BUTTON_TRIGGER_RIGHT),
    ];
    for (offset, index) in triggers {
        if let Some(button) = pad.buttons.get(index) {
            mem.store_f32(layout.base + offset, button.value as f32)?;
        }
    }

    let sticks = [
        (layout.left_x, AXIS_LEFT_X),
        (layout.left_y, AXIS_LEFT_Y),
        (layout.right_x, AXIS_RIGHT_X),
        (layout.right_y, AXIS_RIGHT_Y),
    ];
    for (offset, index) in sticks {
        if let Some(axis) = pad.axes.get(index) {
            mem.store_f32(layout.base + offset, *axis as f32)?;
        }
    }
    Ok(())
}
