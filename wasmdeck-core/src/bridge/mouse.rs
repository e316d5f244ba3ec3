//! Pointer coordinate normalization.
//!
//! Client coordinates (window space) are mapped into surface pixel space
//! through the element's bounding rect and backing resolution. The optional
//! y-flip converts from top-left origin to bottom-left origin; the same
//! function serves the per-frame pointer sync and the synchronous
//! mouse-position query.

use crate::host::SurfaceView;

/// Normalize client coordinates into surface pixel space.
pub fn normalize(view: &SurfaceView, client_x: f64, client_y: f64, flip_y: bool) -> (f64, f64) {
    let rect = view.rect;
    let x = (client_x - rect.left) / (rect.right - rect.left) * view.width as f64;
    let mut y = (client_y - rect.top) / (rect.bottom - rect.top) * view.height as f64;
    if flip_y {
        y = view.height as f64 - y;
    }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;

    fn view() -> SurfaceView {
        SurfaceView {
            rect: Rect { left: 10.0, top: 20.0, right: 330.0, bottom: 260.0 },
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn maps_rect_corners_to_surface_corners() {
        let v = view();
        assert_eq!(normalize(&v, 10.0, 20.0, false), (0.0, 0.0));
        assert_eq!(normalize(&v, 330.0, 260.0, false), (640.0, 480.0));
    }

    #[test]
    fn scales_by_backing_resolution() {
        // Rect is 320x240 in client space but backed by 640x480 pixels.
        let v = view();
        let (x, y) = normalize(&v, 170.0, 140.0, false);
        assert_eq!((x, y), (320.0, 240.0));
    }

    #[test]
    fn flipping_twice_restores_y() {
        let v = view();
        let (_, y) = normalize(&v, 100.0, 100.0, false);
        let (_, flipped) = normalize(&v, 100.0, 100.0, true);
        assert_eq!(v.height as f64 - flipped, y);
        // Applying the flip transform to the flipped value returns the original.
        assert_eq!(v.height as f64 - (v.height as f64 - y), y);
    }
}
