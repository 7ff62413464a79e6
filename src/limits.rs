//! Resource limits for conversions.
//!
//! [`ConvertLimits`] caps the size of bitmaps a conversion will accept and
//! the memory it may allocate. [`LimitExceeded`] is returned when a check
//! fails. Checks run before any allocation or pixel work.

use crate::bitmap::BitmapRef;
use crate::format::PixelFormat;

/// Limits applied by [`convert_with_limits`](crate::convert_with_limits).
///
/// All fields are optional; `None` means no limit for that resource.
///
/// # Example
///
/// ```
/// use pixelcodec::ConvertLimits;
///
/// let limits = ConvertLimits::none()
///     .with_max_pixels(16_000_000)
///     .with_max_memory(64 * 1024 * 1024);
/// assert!(limits.has_any());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConvertLimits {
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum size of the allocated output buffer in bytes.
    pub max_memory_bytes: Option<u64>,
    /// Maximum bitmap width in pixels.
    pub max_width: Option<u32>,
    /// Maximum bitmap height in pixels.
    pub max_height: Option<u32>,
}

impl ConvertLimits {
    /// No limits (all fields `None`).
    pub fn none() -> Self {
        Self::default()
    }

    /// Set maximum total pixels.
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    /// Set maximum output allocation in bytes.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Set maximum width in pixels.
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Set maximum height in pixels.
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Whether any limits are set.
    pub fn has_any(&self) -> bool {
        self.max_pixels.is_some()
            || self.max_memory_bytes.is_some()
            || self.max_width.is_some()
            || self.max_height.is_some()
    }

    /// Check dimensions against `max_width`, `max_height`, and `max_pixels`.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(LimitExceeded::Height {
                actual: height,
                max,
            });
        }
        if let Some(max) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > max {
                return Err(LimitExceeded::Pixels {
                    actual: pixels,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Check an allocation size against `max_memory_bytes`.
    pub fn check_memory(&self, bytes: u64) -> Result<(), LimitExceeded> {
        if let Some(max) = self.max_memory_bytes
            && bytes > max
        {
            return Err(LimitExceeded::Memory { actual: bytes, max });
        }
        Ok(())
    }

    /// Check converting `src` into `dst_format`: dimensions of the source
    /// and the size of the tightly packed output buffer.
    pub fn check_conversion(
        &self,
        src: &BitmapRef<'_>,
        dst_format: PixelFormat,
    ) -> Result<(), LimitExceeded> {
        self.check_dimensions(src.width(), src.height())?;
        let bytes =
            src.width() as u64 * src.height() as u64 * dst_format.bytes_per_pixel() as u64;
        self.check_memory(bytes)
    }
}

/// A conversion limit was exceeded.
///
/// Each variant carries the actual value and the limit that was exceeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitExceeded {
    /// Width exceeded `max_width`.
    Width {
        /// Actual width.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Height exceeded `max_height`.
    Height {
        /// Actual height.
        actual: u32,
        /// Maximum allowed.
        max: u32,
    },
    /// Pixel count exceeded `max_pixels`.
    Pixels {
        /// Actual pixel count.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
    /// Output allocation exceeded `max_memory_bytes`.
    Memory {
        /// Output size in bytes.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
}

impl core::fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Width { actual, max } => write!(f, "width {actual} exceeds limit {max}"),
            Self::Height { actual, max } => write!(f, "height {actual} exceeds limit {max}"),
            Self::Pixels { actual, max } => {
                write!(f, "pixel count {actual} exceeds limit {max}")
            }
            Self::Memory { actual, max } => {
                write!(f, "memory {actual} bytes exceeds limit {max}")
            }
        }
    }
}

impl core::error::Error for LimitExceeded {}
