//! Host import definitions: the Command Bridge.
//!
//! Every function here runs synchronously inside a guest call, reaches host
//! state through `Caller::data_mut`, and touches guest memory through the
//! instance's exported `memory`. Failures stay local: an erroring import
//! traps only the guest call that made it, never the deck.

use crate::{
    abi::{host_imports, import_modules},
    bridge,
    mem::{GuestMemory, WasmMemory},
    state::HostState,
    sync,
    sync::gamepad::{DEFAULT_AXIS_COUNT, DEFAULT_BUTTON_COUNT},
};

use wasmtime::{Caller, Extern, Linker, Memory};

/// Resolve the caller's exported linear memory.
fn guest_memory(caller: &mut Caller<'_, HostState>) -> anyhow::Result<Memory> {
    caller
        .get_export("memory")
        .and_then(Extern::into_memory)
        .ok_or_else(|| anyhow::anyhow!("guest does not export linear `memory`"))
}

/// Define all host imports expected by guests.
///
/// Must be called before instantiating the module.
pub fn define_imports(linker: &mut Linker<HostState>) -> Result<(), anyhow::Error> {
    // --- Cursor ---
    linker.func_wrap(
        import_modules::CURSOR,
        host_imports::SET_CURSOR,
        |mut caller: Caller<'_, HostState>, code: u32| {
            let name = bridge::cursor::cursor_name(code);
            caller.data_mut().surface.set_cursor(name);
        },
    )?;

    // --- Mouse ---
    linker.func_wrap(
        import_modules::MOUSE,
        host_imports::GET_MOUSE_POS,
        |mut caller: Caller<'_, HostState>,
         out_ptr: u32,
         id_ptr: u32,
         id_len: u32,
         client_x: f64,
         client_y: f64,
         flip_y: u32|
         -> anyhow::Result<()> {
            let memory = guest_memory(&mut caller)?;
            let id = WasmMemory::new(memory, &mut caller).load_string(id_ptr, id_len)?;

            // An unknown element id is fatal to this call only.
            let view = caller.data_mut().surface.view_by_id(&id)?;
            let (x, y) = bridge::mouse::normalize(&view, client_x, client_y, flip_y != 0);

            WasmMemory::new(memory, &mut caller).store_f64_array(out_ptr, &[x, y])?;
            Ok(())
        },
    )?;

    // --- Gamepad (pull-style snapshot into caller-specified addresses) ---
    linker.func_wrap(
        import_modules::GAMEPAD,
        host_imports::GET_INPUT,
        |mut caller: Caller<'_, HostState>,
         connected_ptr: u32,
         axes_ptr: u32,
         buttons_ptr: u32,
         button_size: u32,
         pressed_off: u32,
         touched_off: u32,
         value_off: u32|
         -> anyhow::Result<()> {
            let pads = caller.data_mut().input.gamepads();
            let memory = guest_memory(&mut caller)?;
            let mut mem = WasmMemory::new(memory, &mut caller);

            mem.store_u8(connected_ptr, 0)?;
            let Some(pad) = pads.iter().flatten().next() else {
                return Ok(());
            };
            mem.store_u8(connected_ptr, 1)?;

            for (i, axis) in pad.axes.iter().take(DEFAULT_AXIS_COUNT).enumerate() {
                mem.store_f64(axes_ptr + (i * 8) as u32, *axis)?;
            }
            for (i, button) in pad.buttons.iter().take(DEFAULT_BUTTON_COUNT).enumerate() {
                let record = buttons_ptr + i as u32 * button_size;
                mem.store_u8(record + pressed_off, button.pressed as u8)?;
                mem.store_u8(record + touched_off, button.touched as u8)?;
                mem.store_f32(record + value_off, button.value as f32)?;
            }
            Ok(())
        },
    )?;

    // --- Resize ---
    linker.func_wrap(
        import_modules::RESIZE,
        host_imports::UPDATE_SIZE_INFO,
        |mut caller: Caller<'_, HostState>, ptr: u32| -> anyhow::Result<()> {
            // Gather (and resize the backing store) before touching memory.
            let values = sync::resize::size_info_values(caller.data_mut().surface.as_mut());
            let memory = guest_memory(&mut caller)?;
            WasmMemory::new(memory, &mut caller).store_f64_array(ptr, &values)?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        import_modules::RESIZE,
        host_imports::SCROLL_OFFSETS,
        |mut caller: Caller<'_, HostState>, ptr: u32| -> anyhow::Result<()> {
            let (x, y) = caller.data_mut().surface.scroll_offset();
            let memory = guest_memory(&mut caller)?;
            WasmMemory::new(memory, &mut caller).store_f64_array(ptr, &[x, y])?;
            Ok(())
        },
    )?;

    // --- Sound ---
    linker.func_wrap(
        import_modules::SOUND,
        host_imports::PLAY_SOUND,
        |mut caller: Caller<'_, HostState>, index: u32, rate: f64| {
            caller.data_mut().audio.play_sound(index as usize, rate, None);
        },
    )?;

    linker.func_wrap(
        import_modules::SOUND,
        host_imports::PLAY_SOUND_PANNED,
        |mut caller: Caller<'_, HostState>, index: u32, rate: f64, pan: f64| {
            caller
                .data_mut()
                .audio
                .play_sound(index as usize, rate, Some(pan as f32));
        },
    )?;

    linker.func_wrap(
        import_modules::SOUND,
        host_imports::SET_VOLUME,
        |mut caller: Caller<'_, HostState>, gain: f64| {
            caller.data_mut().audio.set_master_gain(gain as f32);
        },
    )?;

    linker.func_wrap(
        import_modules::SOUND,
        host_imports::NOTE_PRESSED,
        |mut caller: Caller<'_, HostState>, index: u32, freq: f64| {
            caller.data_mut().audio.note_pressed(index as usize, freq);
        },
    )?;

    linker.func_wrap(
        import_modules::SOUND,
        host_imports::NOTE_RELEASED,
        |mut caller: Caller<'_, HostState>, index: u32| {
            caller.data_mut().audio.note_released(index as usize);
        },
    )?;

    Ok(())
}
