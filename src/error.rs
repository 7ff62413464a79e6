//! Codec error type.

use core::fmt;

use crate::bitmap::BufferError;
use crate::format::PixelFormat;
use crate::limits::LimitExceeded;

/// Errors from conversion and (un)premultiplication.
///
/// Every failing operation rejects its input before writing any pixel, so
/// an `Err` never leaves a destination half converted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// No conversion path between these formats.
    ///
    /// Also returned for identity requests; callers copy instead.
    UnsupportedConversion {
        /// Source format.
        src: PixelFormat,
        /// Requested destination format.
        dst: PixelFormat,
    },
    /// (Un)premultiplication is only defined for 32-bit four-channel formats.
    NotPremultipliable(PixelFormat),
    /// Source and destination bitmaps differ in size.
    DimensionMismatch {
        /// Source width and height.
        src: (u32, u32),
        /// Destination width and height.
        dst: (u32, u32),
    },
    /// Bitmap geometry is invalid.
    Buffer(BufferError),
    /// A configured limit was exceeded.
    Limit(LimitExceeded),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedConversion { src, dst } => {
                write!(f, "conversion from {src} to {dst} is not supported")
            }
            Self::NotPremultipliable(format) => {
                write!(f, "format {format} cannot be premultiplied or unpremultiplied")
            }
            Self::DimensionMismatch { src, dst } => write!(
                f,
                "source is {}x{} but destination is {}x{}",
                src.0, src.1, dst.0, dst.1
            ),
            Self::Buffer(e) => write!(f, "invalid bitmap: {e}"),
            Self::Limit(e) => write!(f, "limit exceeded: {e}"),
        }
    }
}

impl core::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Buffer(e) => Some(e),
            Self::Limit(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferError> for CodecError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

impl From<LimitExceeded> for CodecError {
    fn from(e: LimitExceeded) -> Self {
        Self::Limit(e)
    }
}
