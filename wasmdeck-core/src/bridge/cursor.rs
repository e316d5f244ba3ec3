//! Cursor-shape codes.
//!
//! Guests pass a small integer; the bridge maps it to a CSS cursor name and
//! applies it to the primary surface. Unknown codes fall back to `"default"`
//! rather than failing.

/// Fallback for codes outside the table.
pub const DEFAULT_CURSOR: &str = "default";

/// Map a cursor code to its CSS cursor name.
pub fn cursor_name(code: u32) -> &'static str {
    match code {
        0 => "auto",
        1 => "default",
        2 => "none",
        3 => "context-menu",
        4 => "help",
        5 => "pointer",
        6 => "progress",
        7 => "wait",
        8 => "cell",
        9 => "crosshair",
        10 => "text",
        11 => "vertical-text",
        12 => "alias",
        13 => "copy",
        14 => "move",
        15 => "no-drop",
        16 => "not-allowed",
        17 => "grab",
        18 => "grabbing",
        19 => "e-resize",
        20 => "n-resize",
        21 => "ne-resize",
        22 => "nw-resize",
        23 => "s-resize",
        24 => "se-resize",
        25 => "sw-resize",
        26 => "w-resize",
        27 => "ew-resize",
        28 => "ns-resize",
        29 => "nesw-resize",
        30 => "nwse-resize",
        31 => "col-resize",
        32 => "row-resize",
        33 => "all-scroll",
        34 => "zoom-in",
        35 => "zoom-out",
        _ => DEFAULT_CURSOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_names() {
        assert_eq!(cursor_name(0), "auto");
        assert_eq!(cursor_name(5), "pointer");
        assert_eq!(cursor_name(18), "grabbing");
        assert_eq!(cursor_name(35), "zoom-out");
    }

    #[test]
    fn unknown_codes_fall_back_to_default() {
        assert_eq!(cursor_name(36), DEFAULT_CURSOR);
        assert_eq!(cursor_name(u32::MAX), DEFAULT_CURSOR);
    }
}
