//! Pixel layout conversion and alpha (un)premultiplication.
//!
//! This crate converts strided 8-bit pixel buffers between a closed set of
//! layouts and premultiplies or unpremultiplies alpha in place:
//!
//! - [`PixelFormat`] / [`PixelLayout`]: format tags with classic raw codes
//! - [`Bitmap`] / [`BitmapRef`] / [`BitmapMut`]: owned and borrowed buffers
//! - [`convert`] / [`convert_into`]: layout conversion through canonical RGBA
//! - [`premultiply`] / [`unpremultiply`]: in-place alpha arithmetic
//! - [`convert_and_premult`]: conversion to an exact target format
//! - [`ConvertLimits`]: size caps checked before allocating
//!
//! Supported layouts are `G_8`, `RGB_888`, `BGR_888` and the four 32-bit
//! orderings `RGBA`, `BGRA`, `ARGB`, `ABGR`. Everything else is rejected
//! with an error before any pixel is touched.
//!
//! ```
//! use pixelcodec::{convert, premultiply, BitmapMut, BitmapRef, PixelFormat};
//!
//! let mut rgba = [255, 0, 0, 128, 0, 255, 0, 64];
//! let mut bmp = BitmapMut::new(&mut rgba, 2, 1, 8, PixelFormat::RGBA_8888)?;
//! premultiply(&mut bmp)?;
//! assert_eq!(bmp.format(), PixelFormat::RGBA_8888_PRE);
//! assert_eq!(rgba, [128, 0, 0, 128, 0, 64, 0, 64]);
//!
//! let src = BitmapRef::new(&rgba, 2, 1, 8, PixelFormat::RGBA_8888_PRE)?;
//! let bgr = convert(&src, PixelFormat::BGR_888)?;
//! assert_eq!(bgr.data(), &[0, 0, 128, 0, 64, 0]);
//! # Ok::<(), pixelcodec::CodecError>(())
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod bitmap;
mod codec;
mod error;
mod format;
mod limits;
pub mod pixel;

pub use bitmap::{Bitmap, BitmapMut, BitmapRef, BufferError, copy_subregion};
pub use codec::{
    can_convert, can_premultiply, can_unpremultiply, convert, convert_and_premult, convert_into,
    convert_with_limits, premultiply, unpremultiply,
};
pub use error::CodecError;
pub use format::{FormatCategory, FormatFlags, PixelFormat, PixelLayout, UNORDERED_MASK};
pub use limits::{ConvertLimits, LimitExceeded};

// Re-exports for callers working with typed pixels.
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::Rgba;
