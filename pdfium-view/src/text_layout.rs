//! Character layout reconstruction
//!
//! Turns a page's text layer into one [`CharEntity`] per character, each with
//! a device-space box that:
//!
//! - spans the full height of the line the character sits on,
//! - reaches horizontally up to the next character on the same line,
//! - exists even for control characters the engine reports with no size.
//!
//! Boxes are laid out in the page's unit viewport (one pixel per point).

use crate::backend::TextLayerBackend;
use crate::geometry::{page_rect_to_device, DeviceTransform, DeviceViewport, PageRect, PixelRect};
use serde::Serialize;
use tracing::trace;

/// Glyph boxes at or below this size (in pixels of the unit viewport) are
/// treated as control characters.
pub const ZERO_SIZE_TOLERANCE: f64 = 1e-5;

/// One character of reconstructed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharEntity {
    pub text: char,
    /// Device-space box, exclusive right/bottom
    pub area: PixelRect,
}

/// Device box of character `index`: the tight glyph box widened by the
/// loose box's width.
fn char_device_box<P, T>(page: &P, text: &T, viewport: &DeviceViewport, index: usize) -> Option<PixelRect>
where
    P: DeviceTransform + ?Sized,
    T: TextLayerBackend + ?Sized,
{
    let glyph = text.char_box(index)?.normalized();
    let spacing = text
        .loose_char_box(index)
        .map(|loose| loose.width())
        .unwrap_or(0.0);
    let widened = PageRect::new(glyph.left, glyph.top, glyph.right + spacing, glyph.bottom);
    page_rect_to_device(page, viewport, &widened)
}

fn is_collapsed(rect: &PixelRect) -> bool {
    f64::from(rect.width()) <= ZERO_SIZE_TOLERANCE || f64::from(rect.height()) <= ZERO_SIZE_TOLERANCE
}

/// Box for a zero-size character, derived from the box of the character before it.
///
/// Line breaks take the last pixel column of the previous box. Anything else
/// starts right after it and keeps its own width.
fn synthesize(code: u32, own: &PixelRect, previous: &PixelRect) -> PixelRect {
    if code == u32::from('\r') || code == u32::from('\n') {
        PixelRect::new(previous.right - 1, previous.top, previous.right, previous.bottom)
    } else {
        PixelRect::new(previous.right, previous.top, previous.right + own.width(), previous.bottom)
    }
}

/// Build the character entities for a page.
///
/// The result has exactly `text.char_count()` entries, in text layer order.
/// Zero-size characters at index 0 or 1 keep an empty box; later ones borrow
/// their geometry from the character before them.
pub fn reconstruct<P, T>(page: &P, text: &T, viewport: &DeviceViewport) -> Vec<CharEntity>
where
    P: DeviceTransform + ?Sized,
    T: TextLayerBackend + ?Sized,
{
    let char_count = text.char_count();
    let rect_count = text.rect_count();
    let mut entities: Vec<CharEntity> = Vec::with_capacity(char_count);

    let mut line = PixelRect::default();
    let mut next_rect = 0;

    for index in 0..char_count {
        let code = text.unicode(index);
        let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        let char_box = char_device_box(page, text, viewport, index).unwrap_or_default();

        if is_collapsed(&char_box) {
            let area = if index >= 2 {
                synthesize(code, &char_box, &entities[index - 1].area)
            } else {
                trace!(index, "zero-size character without lookback");
                PixelRect::default()
            };
            entities.push(CharEntity { text: ch, area });
            continue;
        }

        if (line.is_empty() || !line.intersects(&char_box)) && next_rect < rect_count {
            line = text
                .rect(next_rect)
                .and_then(|rect| page_rect_to_device(page, viewport, &rect))
                .unwrap_or_default();
            next_rect += 1;
        }

        // A page without line rects leaves `line` empty; the glyph box stands alone.
        let area = if line.is_empty() {
            char_box
        } else {
            let top = line.top.min(char_box.top);
            let bottom = line.bottom.max(char_box.bottom);
            PixelRect::new(char_box.left, top, char_box.right, bottom)
        };

        if let Some(previous) = entities.last_mut() {
            if previous.area.top == area.top {
                previous.area.right = area.left;
            }
        }
        entities.push(CharEntity { text: ch, area });
    }

    entities
}
