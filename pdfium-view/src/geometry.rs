//! Coordinate types and page-space/device-space conversions
//!
//! Two coordinate systems are in play:
//!
//! - **Page space**: PDF points (1/72 inch), origin bottom-left, Y grows up.
//! - **Device space**: integer pixels, origin top-left, Y grows down.
//!
//! The page-to-device mapping itself belongs to the backend
//! ([`DeviceTransform`]); the helpers here apply it to whole rectangles and
//! normalize the result, since a Y-flip or rotation can swap corner order.

use serde::Serialize;

/// Page rotation in 90-degree increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Rotation {
    /// No rotation (0 degrees)
    #[default]
    None = 0,
    /// 90 degrees clockwise
    Clockwise90 = 1,
    /// 180 degrees
    Rotated180 = 2,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Clockwise270 = 3,
}

impl Rotation {
    /// Create rotation from raw PDFium value (0-3).
    pub fn from_raw(value: i32) -> Self {
        match value.rem_euclid(4) {
            1 => Self::Clockwise90,
            2 => Self::Rotated180,
            3 => Self::Clockwise270,
            _ => Self::None,
        }
    }

    /// Get the raw PDFium rotation value.
    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    /// Get the rotation in degrees (0, 90, 180, or 270).
    pub fn as_degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotated180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Whether width and height trade places under this rotation.
    pub fn is_sideways(&self) -> bool {
        matches!(self, Self::Clockwise90 | Self::Clockwise270)
    }

    /// Compose two rotations.
    pub fn then(self, other: Rotation) -> Rotation {
        Rotation::from_raw(self.as_raw() + other.as_raw())
    }
}

/// A point in page space (points, Y-up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
}

impl PagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in page space (points, Y-up).
///
/// Backends report these with `top > bottom` most of the time, but nothing
/// relies on it; use [`PageRect::normalized`] before measuring.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PageRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Reorder the edges so that `left <= right` and `bottom <= top`.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            right: self.left.max(self.right),
            bottom: self.bottom.min(self.top),
            top: self.bottom.max(self.top),
        }
    }

    /// Width of the rectangle (never negative).
    pub fn width(&self) -> f64 {
        (self.right - self.left).abs()
    }

    /// Height of the rectangle (never negative).
    pub fn height(&self) -> f64 {
        (self.top - self.bottom).abs()
    }
}

/// Page size in points, as reported for the page's current rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Size in pixels at the given horizontal/vertical DPI.
    pub fn at_dpi(&self, dpi_x: f64, dpi_y: f64) -> (f64, f64) {
        (self.width / 72.0 * dpi_x, self.height / 72.0 * dpi_y)
    }

    /// The device viewport that maps this page 1:1 (one pixel per point).
    pub fn unit_viewport(&self) -> DeviceViewport {
        DeviceViewport::new(self.width as i32, self.height as i32)
    }
}

/// A rectangle in device space. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl PixelRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from origin and size.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// A rectangle with no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Reorder the edges so that `left <= right` and `top <= bottom`.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            right: self.left.max(self.right),
            top: self.top.min(self.bottom),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Whether the two rectangles share a region of positive area.
    /// Empty rectangles intersect nothing.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// A rectangle relative to the page size, `[0, 1]` on both axes, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizedRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl NormalizedRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Divide a device rectangle by the dimensions it was laid out in,
    /// clamping into the unit square.
    pub fn from_pixel_rect(rect: &PixelRect, width: f64, height: f64) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::default();
        }
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let rect = rect.normalized();
        Self {
            left: clamp(rect.left as f64 / width),
            top: clamp(rect.top as f64 / height),
            right: clamp(rect.right as f64 / width),
            bottom: clamp(rect.bottom as f64 / height),
        }
    }

    /// Scale back up to a pixel rectangle of the given output size.
    pub fn geometry(&self, width: u32, height: u32) -> PixelRect {
        let (w, h) = (width as f64, height as f64);
        PixelRect::new(
            (self.left * w).round() as i32,
            (self.top * h).round() as i32,
            (self.right * w).round() as i32,
            (self.bottom * h).round() as i32,
        )
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A point relative to the page size, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The output pixel rectangle a page is laid out in, plus the extra display
/// rotation (the argument PDFium calls `rotate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceViewport {
    pub start_x: i32,
    pub start_y: i32,
    pub size_x: i32,
    pub size_y: i32,
    pub rotate: Rotation,
}

impl DeviceViewport {
    /// Viewport at the origin with no display rotation.
    pub fn new(size_x: i32, size_y: i32) -> Self {
        Self {
            start_x: 0,
            start_y: 0,
            size_x,
            size_y,
            rotate: Rotation::None,
        }
    }
}

/// The backend's page-to-device mapping for one page.
pub trait DeviceTransform {
    /// Map a page-space point into the viewport. `None` when the backend refuses.
    fn page_to_device(&self, viewport: &DeviceViewport, point: PagePoint) -> Option<(i32, i32)>;

    /// Inverse of [`DeviceTransform::page_to_device`].
    fn device_to_page(&self, viewport: &DeviceViewport, x: i32, y: i32) -> Option<PagePoint>;
}

/// Transform both corners of `rect` and normalize the result.
pub fn page_rect_to_device<T>(transform: &T, viewport: &DeviceViewport, rect: &PageRect) -> Option<PixelRect>
where
    T: DeviceTransform + ?Sized,
{
    let (x0, y0) = transform.page_to_device(viewport, PagePoint::new(rect.left, rect.top))?;
    let (x1, y1) = transform.page_to_device(viewport, PagePoint::new(rect.right, rect.bottom))?;
    Some(PixelRect::new(x0, y0, x1, y1).normalized())
}

/// Inverse of [`page_rect_to_device`]: map a device rectangle back into page
/// space, normalized so that `bottom <= top`.
pub fn device_rect_to_page<T>(transform: &T, viewport: &DeviceViewport, rect: &PixelRect) -> Option<PageRect>
where
    T: DeviceTransform + ?Sized,
{
    let a = transform.device_to_page(viewport, rect.left, rect.top)?;
    let b = transform.device_to_page(viewport, rect.right, rect.bottom)?;
    Some(PageRect::new(a.x, a.y, b.x, b.y).normalized())
}
