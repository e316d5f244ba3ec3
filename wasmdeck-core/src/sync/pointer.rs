//! Pointer position sync.
//!
//! Pointer coordinates arrive through the surface's event side channel, not
//! by querying the OS each frame. The driver normalizes them into surface
//! pixel space at event time and writes the cached pair into the guest's
//! pointer region once per frame as two f32 values.

use crate::bridge::mouse;
use crate::host::SurfaceView;
use crate::mem::{GuestMemory, MemoryError};

/// Offsets for the guest's pointer region.
#[derive(Clone, Copy, Debug)]
pub struct PointerLayout {
    pub base: u32,
    pub x: u32,
    pub y: u32,
}

pub struct PointerSync {
    layout: PointerLayout,
    flip_y: bool,
    position: (f64, f64),
}

impl PointerSync {
    pub fn new(layout: PointerLayout, flip_y: bool) -> Self {
        Self { layout, flip_y, position: (0.0, 0.0) }
    }

    /// Feed a pointer-move event captured by the surface side channel.
    pub fn on_pointer_moved(&mut self, view: &SurfaceView, client_x: f64, client_y: f64) {
        self.position = mouse::normalize(view, client_x, client_y, self.flip_y);
    }

    /// Write the cached position into guest memory.
    pub fn step(&self, mem: &mut dyn GuestMemory) -> Result<(), MemoryError> {
        mem.store_f32(self.layout.base + self.layout.x, self.position.0 as f32)?;
        mem.store_f32(self.layout.base + self.layout.y, self.position.1 as f32)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;
    use crate::mem::GuestMemory;

    fn view() -> SurfaceView {
        SurfaceView {
            rect: Rect { left: 0.0, top: 0.0, right: 320.0, bottom: 240.0 },
            width: 320,
            height: 240,
        }
    }

    #[test]
    fn writes_cached_position_each_step() {
        let mut sync = PointerSync::new(PointerLayout { base: 32, x: 0, y: 4 }, false);
        let mut mem = vec![0u8; 64];

        sync.step(&mut mem).unwrap();
        assert_eq!(mem.load_f32(32).unwrap(), 0.0);

        sync.on_pointer_moved(&view(), 160.0, 60.0);
        sync.step(&mut mem).unwrap();
        assert_eq!(mem.load_f32(32).unwrap(), 160.0);
        assert_eq!(mem.load_f32(36).unwrap(), 60.0);
    }

    #[test]
    fn flip_converts_to_bottom_left_origin() {
        let mut sync = PointerSync::new(PointerLayout { base: 0, x: 0, y: 4 }, true);
        let mut mem = vec![0u8; 16];

        sync.on_pointer_moved(&view(), 0.0, 0.0);
        sync.step(&mut mem).unwrap();
        assert_eq!(mem.load_f32(4).unwrap(), 240.0, "top of rect maps to height");
    }
}
