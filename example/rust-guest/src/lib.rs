#![no_std]

// Minimal wasmdeck Rust guest example.
//
// This crate is meant to be compiled to `wasm32-unknown-unknown` and loaded
// by `wasmdeck-core`.
//
// The host calls `deck_init()` once at startup and `deck_frame()` once per
// frame, after it has refreshed the input regions below.

use wasmdeck_sdk::prelude::*;

// Input regions the host syncs each frame. The macros export the accessor
// functions that disclose their layout.
static mut GAMEPAD: GamepadRegion = GamepadRegion::ZERO;
static mut POINTER: PointerRegion = PointerRegion::ZERO;

wasmdeck_sdk::export_gamepad_region!(GAMEPAD);
wasmdeck_sdk::export_pointer_region!(POINTER);

// Sound indices as configured in the host's sound bank.
const SOUND_POP: u32 = 0;

// Simple edge detection so a held button plays one pop, not sixty per second.
static mut SOUTH_WAS_DOWN: bool = false;
// Note index 0 follows the pointer; pressed while the east button is held.
static mut NOTE_WAS_DOWN: bool = false;

#[unsafe(no_mangle)]
pub extern "C" fn deck_init() {
    sound::set_volume(0.5);
    cursor::set(Cursor::Crosshair);
}

#[unsafe(no_mangle)]
pub extern "C" fn deck_frame() {
    let pad = unsafe { core::ptr::addr_of!(GAMEPAD).read() };
    let pointer = unsafe { core::ptr::addr_of!(POINTER).read() };

    if !pad.is_connected() {
        return;
    }

    // South face button: one pop per press, pitched by the left trigger.
    let south_down = pad.buttons[0].is_pressed();
    let south_was_down = unsafe { core::ptr::addr_of!(SOUTH_WAS_DOWN).read() };
    if south_down && !south_was_down {
        let rate = 1.0 + pad.buttons[6].value as f64;
        sound::play(SOUND_POP, rate);
    }
    unsafe { core::ptr::addr_of_mut!(SOUTH_WAS_DOWN).write(south_down) };

    // East face button holds a tone whose pitch tracks the pointer's height.
    let note_down = pad.buttons[1].is_pressed();
    let note_was_down = unsafe { core::ptr::addr_of!(NOTE_WAS_DOWN).read() };
    if note_down {
        let freq = 220.0 + pointer.y as f64;
        sound::note_pressed(0, freq);
    } else if note_was_down {
        sound::note_released(0);
    }
    unsafe { core::ptr::addr_of_mut!(NOTE_WAS_DOWN).write(note_down) };

    // Grab cursor while the left stick is deflected.
    if pad.axes[0] > 0.5 || pad.axes[0] < -0.5 {
        cursor::set(Cursor::Grabbing);
    }
}
