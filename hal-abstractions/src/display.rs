//! Status presentation sink

/// Longest status line the node renders
///
/// Matches a 128x64 OLED at the 2x3 glyph font: 16 columns of 8 pixels.
pub const STATUS_TEXT_LEN: usize = 16;

/// A write-only status display
///
/// The node pushes a pre-formatted line after every harvest. Nothing ever
/// flows back from the display into the scheduling core.
pub trait StatusDisplay {
    /// Replace the current status line
    fn show(&mut self, text: &str);
}
