//! Strided pixel buffers.
//!
//! [`Bitmap`] owns its bytes; [`BitmapRef`] and [`BitmapMut`] borrow
//! someone else's. All three carry width, height, row stride and a
//! [`PixelFormat`]. Rows may be padded: only the first `width * bpp` bytes
//! of each row are pixels, the rest is never read or written.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use imgref::{ImgRef, ImgVec};
use rgb::Rgba;

use crate::error::CodecError;
use crate::format::PixelFormat;
use crate::pixel;

// ---------------------------------------------------------------------------
// BufferError
// ---------------------------------------------------------------------------

/// Errors from bitmap construction and copying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BufferError {
    /// Data slice is too small for the given dimensions and stride.
    InsufficientData,
    /// Row stride is smaller than `width * bytes_per_pixel`.
    StrideTooSmall,
    /// Dimensions overflow `usize`.
    InvalidDimensions,
    /// The format has no defined bytes-per-pixel.
    UndefinedPixelSize,
    /// Source and destination formats differ.
    FormatMismatch,
    /// A region lies outside the bitmap.
    OutOfBounds,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => {
                write!(f, "data slice is too small for the given dimensions")
            }
            Self::StrideTooSmall => write!(f, "stride is smaller than width * bytes_per_pixel"),
            Self::InvalidDimensions => write!(f, "width or height causes overflow"),
            Self::UndefinedPixelSize => write!(f, "pixel format has no defined pixel size"),
            Self::FormatMismatch => write!(f, "source and destination formats differ"),
            Self::OutOfBounds => write!(f, "region lies outside the bitmap"),
        }
    }
}

impl core::error::Error for BufferError {}

/// Validate geometry and return the packed row length in bytes.
fn validate(
    len: usize,
    width: u32,
    height: u32,
    rowstride: usize,
    format: PixelFormat,
) -> Result<usize, BufferError> {
    let bpp = format.bytes_per_pixel();
    if bpp == 0 {
        return Err(BufferError::UndefinedPixelSize);
    }
    let row_bytes = (width as usize)
        .checked_mul(bpp)
        .ok_or(BufferError::InvalidDimensions)?;
    if rowstride < row_bytes {
        return Err(BufferError::StrideTooSmall);
    }
    if height > 0 && len < required_bytes(height, rowstride, row_bytes)? {
        return Err(BufferError::InsufficientData);
    }
    Ok(row_bytes)
}

/// Minimum bytes needed: `(rows - 1) * stride + row_bytes`.
fn required_bytes(rows: u32, stride: usize, row_bytes: usize) -> Result<usize, BufferError> {
    let preceding = (rows as usize - 1)
        .checked_mul(stride)
        .ok_or(BufferError::InvalidDimensions)?;
    preceding
        .checked_add(row_bytes)
        .ok_or(BufferError::InvalidDimensions)
}

// ---------------------------------------------------------------------------
// BitmapRef (borrowed, immutable)
// ---------------------------------------------------------------------------

/// Borrowed read-only bitmap.
#[derive(Clone, Copy)]
pub struct BitmapRef<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    rowstride: usize,
    format: PixelFormat,
}

impl<'a> BitmapRef<'a> {
    /// Wrap `data` as a bitmap.
    ///
    /// # Errors
    ///
    /// Returns an error if the format has no pixel size, the stride is
    /// smaller than a packed row, or the data is too short.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        rowstride: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        validate(data.len(), width, height, rowstride, format)?;
        Ok(Self {
            data,
            width,
            height,
            rowstride,
            format,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn rowstride(&self) -> usize {
        self.rowstride
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Underlying bytes, padding included.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.rowstride;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..start + len]
    }

    /// Copy into a tightly packed owned [`Bitmap`] with the same format.
    pub fn to_bitmap(&self) -> Bitmap {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        let mut data = Vec::with_capacity(row_bytes * self.height as usize);
        for y in 0..self.height {
            data.extend_from_slice(self.row(y));
        }
        Bitmap {
            data,
            width: self.width,
            height: self.height,
            rowstride: row_bytes,
            format: self.format,
        }
    }

    /// Decode every pixel into canonical RGBA.
    ///
    /// Premultiplied input stays premultiplied; only the layout changes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedConversion`] for formats that cannot
    /// be decoded (alpha-only, 16-bit packed, YUV).
    pub fn to_rgba8(&self) -> Result<ImgVec<Rgba<u8>>, CodecError> {
        let layout = self.format.layout();
        if !pixel::has_table_entry(layout) {
            return Err(CodecError::UnsupportedConversion {
                src: self.format,
                dst: PixelFormat::RGBA_8888.with_premultiplied(self.format.is_premultiplied()),
            });
        }
        let bpp = self.format.bytes_per_pixel();
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for src in self.row(y).chunks_exact(bpp) {
                if let Some(px) = pixel::decode(layout, src) {
                    pixels.push(px);
                }
            }
        }
        Ok(ImgVec::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }
}

impl fmt::Debug for BitmapRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BitmapRef({}x{}, stride {}, {})",
            self.width, self.height, self.rowstride, self.format
        )
    }
}

// ---------------------------------------------------------------------------
// BitmapMut (borrowed, mutable)
// ---------------------------------------------------------------------------

/// Borrowed mutable bitmap.
///
/// In-place operations update the view's format; read it back with
/// [`format`](Self::format) when the caller tracks formats separately.
pub struct BitmapMut<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    rowstride: usize,
    format: PixelFormat,
}

impl<'a> BitmapMut<'a> {
    /// Wrap `data` as a mutable bitmap.
    ///
    /// # Errors
    ///
    /// Same validation as [`BitmapRef::new`].
    pub fn new(
        data: &'a mut [u8],
        width: u32,
        height: u32,
        rowstride: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        validate(data.len(), width, height, rowstride, format)?;
        Ok(Self {
            data,
            width,
            height,
            rowstride,
            format,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn rowstride(&self) -> usize {
        self.rowstride
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub(crate) fn set_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    /// Pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.rowstride;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..start + len]
    }

    /// Mutable pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(
            y < self.height,
            "row index {y} out of bounds (height: {})",
            self.height
        );
        let start = y as usize * self.rowstride;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &mut self.data[start..start + len]
    }

    /// Reborrow as a read-only view.
    pub fn view(&self) -> BitmapRef<'_> {
        BitmapRef {
            data: &*self.data,
            width: self.width,
            height: self.height,
            rowstride: self.rowstride,
            format: self.format,
        }
    }
}

impl fmt::Debug for BitmapMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BitmapMut({}x{}, stride {}, {})",
            self.width, self.height, self.rowstride, self.format
        )
    }
}

// ---------------------------------------------------------------------------
// Bitmap (owned)
// ---------------------------------------------------------------------------

/// Owned bitmap.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<u8>,
    width: u32,
    height: u32,
    rowstride: usize,
    format: PixelFormat,
}

impl Bitmap {
    /// Allocate a zero-filled, tightly packed bitmap.
    ///
    /// # Errors
    ///
    /// Returns an error if the format has no pixel size or the dimensions
    /// overflow.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, BufferError> {
        let bpp = format.bytes_per_pixel();
        if bpp == 0 {
            return Err(BufferError::UndefinedPixelSize);
        }
        let rowstride = (width as usize)
            .checked_mul(bpp)
            .ok_or(BufferError::InvalidDimensions)?;
        let total = rowstride
            .checked_mul(height as usize)
            .ok_or(BufferError::InvalidDimensions)?;
        Ok(Self {
            data: vec![0u8; total],
            width,
            height,
            rowstride,
            format,
        })
    }

    /// Take ownership of `data` laid out with `rowstride`.
    ///
    /// # Errors
    ///
    /// Same validation as [`BitmapRef::new`].
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        rowstride: usize,
        format: PixelFormat,
    ) -> Result<Self, BufferError> {
        validate(data.len(), width, height, rowstride, format)?;
        Ok(Self {
            data,
            width,
            height,
            rowstride,
            format,
        })
    }

    /// Build a straight or premultiplied `RGBA_8888` bitmap from typed pixels.
    pub fn from_rgba8(img: ImgRef<'_, Rgba<u8>>, premultiplied: bool) -> Self {
        let width = img.width();
        let height = img.height();
        let mut data = Vec::with_capacity(width * height * 4);
        for row in img.rows() {
            for px in row {
                data.extend_from_slice(&[px.r, px.g, px.b, px.a]);
            }
        }
        Self {
            data,
            width: width as u32,
            height: height as u32,
            rowstride: width * 4,
            format: PixelFormat::RGBA_8888.with_premultiplied(premultiplied),
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between row starts.
    #[inline]
    pub fn rowstride(&self) -> usize {
        self.rowstride
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Underlying bytes, padding included.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the bitmap and return its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        self.view().row(y)
    }

    /// Borrow as a [`BitmapRef`].
    pub fn view(&self) -> BitmapRef<'_> {
        BitmapRef {
            data: &self.data,
            width: self.width,
            height: self.height,
            rowstride: self.rowstride,
            format: self.format,
        }
    }

    /// Borrow as a [`BitmapMut`].
    ///
    /// Format changes made through the view are not written back; use
    /// [`premultiply`](Self::premultiply) and
    /// [`unpremultiply`](Self::unpremultiply) on the owner instead.
    pub fn view_mut(&mut self) -> BitmapMut<'_> {
        BitmapMut {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            rowstride: self.rowstride,
            format: self.format,
        }
    }

    /// Premultiply in place. See [`crate::premultiply`].
    pub fn premultiply(&mut self) -> Result<(), CodecError> {
        let mut view = self.view_mut();
        crate::codec::premultiply(&mut view)?;
        let format = view.format();
        self.format = format;
        Ok(())
    }

    /// Unpremultiply in place. See [`crate::unpremultiply`].
    pub fn unpremultiply(&mut self) -> Result<(), CodecError> {
        let mut view = self.view_mut();
        crate::codec::unpremultiply(&mut view)?;
        let format = view.format();
        self.format = format;
        Ok(())
    }

    /// Decode every pixel into canonical RGBA. See [`BitmapRef::to_rgba8`].
    pub fn to_rgba8(&self) -> Result<ImgVec<Rgba<u8>>, CodecError> {
        self.view().to_rgba8()
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bitmap({}x{}, stride {}, {})",
            self.width, self.height, self.rowstride, self.format
        )
    }
}

// ---------------------------------------------------------------------------
// Sub-region copy
// ---------------------------------------------------------------------------

/// Copy a `size` rectangle from `src` at `src_origin` to `dst` at `dst_origin`.
///
/// Both bitmaps must share a format. Bytes are copied verbatim; no
/// conversion or premultiplication happens.
///
/// # Errors
///
/// [`BufferError::FormatMismatch`] if the formats differ,
/// [`BufferError::OutOfBounds`] if the rectangle does not fit either bitmap.
pub fn copy_subregion(
    src: &BitmapRef<'_>,
    src_origin: (u32, u32),
    dst: &mut BitmapMut<'_>,
    dst_origin: (u32, u32),
    size: (u32, u32),
) -> Result<(), BufferError> {
    if src.format() != dst.format() {
        return Err(BufferError::FormatMismatch);
    }
    let fits = |origin: (u32, u32), width: u32, height: u32| {
        origin.0.checked_add(size.0).is_some_and(|end| end <= width)
            && origin.1.checked_add(size.1).is_some_and(|end| end <= height)
    };
    if !fits(src_origin, src.width(), src.height()) || !fits(dst_origin, dst.width(), dst.height())
    {
        return Err(BufferError::OutOfBounds);
    }

    let bpp = src.format().bytes_per_pixel();
    let len = size.0 as usize * bpp;
    let src_x = src_origin.0 as usize * bpp;
    let dst_x = dst_origin.0 as usize * bpp;
    for row in 0..size.1 {
        let from = &src.row(src_origin.1 + row)[src_x..src_x + len];
        dst.row_mut(dst_origin.1 + row)[dst_x..dst_x + len].copy_from_slice(from);
    }
    Ok(())
}
