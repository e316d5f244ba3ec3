//! Window/surface size info and pixel-ratio tracking.
//!
//! `size_info_values` couples "read the size" with "set the backing
//! resolution": the surface's backing store is resized to `rect * dpr` in
//! the same operation that reports sizes to the guest, so rendering stays
//! crisp across DPR changes. The two must not be separated.
//!
//! [`DprWatcher`] keeps the ratio current through one-shot change
//! subscriptions: each time the ratio crosses the watched threshold, the
//! watcher re-subscribes at the new ratio, so the next change in either
//! direction fires again.

use crate::host::Surface;
use crate::mem::{GuestMemory, MemoryError};

/// Number of f64 slots in the size-info tuple.
pub const SIZE_INFO_LEN: usize = 7;

/// Gather the size-info tuple and update the surface backing resolution.
///
/// Tuple order: window width, window height, rect width, rect height,
/// rect left, rect top, device pixel ratio.
pub fn size_info_values(surface: &mut dyn Surface) -> [f64; SIZE_INFO_LEN] {
    let (window_w, window_h) = surface.window_inner_size();
    let dpr = surface.device_pixel_ratio();
    let rect = surface.view().rect;
    surface.set_backing_size(
        (rect.width() * dpr) as u32,
        (rect.height() * dpr) as u32,
    );
    [window_w, window_h, rect.width(), rect.height(), rect.left, rect.top, dpr]
}

/// Gather and write the tuple at `addr` in guest memory.
pub fn write_size_info(
    mem: &mut dyn GuestMemory,
    addr: u32,
    surface: &mut dyn Surface,
) -> Result<(), MemoryError> {
    let values = size_info_values(surface);
    mem.store_f64_array(addr, &values)
}

/// Tracks the device pixel ratio via self-renewing one-shot subscriptions.
pub struct DprWatcher {
    current: f64,
}

impl DprWatcher {
    /// Read the current ratio and register the first watch.
    pub fn new(surface: &mut dyn Surface) -> Self {
        let current = surface.device_pixel_ratio();
        surface.watch_pixel_ratio(current);
        Self { current }
    }

    /// Handle a ratio-change event: adopt the new ratio and re-subscribe so
    /// the next change fires too.
    pub fn on_ratio_changed(&mut self, surface: &mut dyn Surface, ratio: f64) {
        log::debug!("device pixel ratio changed: {} -> {}", self.current, ratio);
        self.current = ratio;
        surface.watch_pixel_ratio(ratio);
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}
