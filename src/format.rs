//! Pixel format tags.
//!
//! A [`PixelFormat`] is a channel layout plus a premultiplied flag. Raw
//! `u32` codes follow the classic packing: the low nibble selects the
//! size class (the "unordered mask") and bits 4..7 carry [`FormatFlags`].

use bitflags::bitflags;

bitflags! {
    /// Per-format flag bits stored above the size-class nibble.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u32 {
        /// The layout has an alpha channel.
        const ALPHA       = 1 << 4;
        /// Color channels are stored blue first.
        const BGR         = 1 << 5;
        /// Alpha is the first byte of the pixel instead of the last.
        const ALPHA_FIRST = 1 << 6;
        /// Color channels are already scaled by alpha.
        const PREMULT     = 1 << 7;
    }
}

/// Mask selecting the size class from a raw format code.
pub const UNORDERED_MASK: u32 = 0x0F;

/// Size class of a format, independent of channel order and premultiplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatCategory {
    /// One byte of luminance.
    Gray8,
    /// Three bytes per pixel, byte aligned.
    Packed24,
    /// Four bytes per pixel, byte aligned.
    Packed32,
    /// Any other size class (alpha-only, 16-bit packed, YUV).
    Other(u8),
}

impl FormatCategory {
    /// Whether pixels of this class can be decoded to canonical RGBA.
    #[inline]
    pub const fn is_decodable(self) -> bool {
        matches!(self, Self::Gray8 | Self::Packed24 | Self::Packed32)
    }

    /// Whether canonical RGBA can be encoded into this class.
    #[inline]
    pub const fn is_encodable(self) -> bool {
        matches!(self, Self::Packed24 | Self::Packed32 | Self::Gray8)
    }
}

/// Channel layout of a pixel, without the premultiplied state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelLayout {
    /// 8-bit alpha mask.
    A8,
    /// 16-bit packed 5-6-5 RGB.
    Rgb565,
    /// 16-bit packed 4-4-4-4 RGBA.
    Rgba4444,
    /// 16-bit packed 5-5-5-1 RGBA.
    Rgba5551,
    /// Planar YUV; pixel size is undefined.
    Yuv,
    /// 8-bit luminance.
    G8,
    /// Red, green, blue.
    Rgb888,
    /// Blue, green, red.
    Bgr888,
    /// Red, green, blue, alpha.
    Rgba8888,
    /// Blue, green, red, alpha.
    Bgra8888,
    /// Alpha, red, green, blue.
    Argb8888,
    /// Alpha, blue, green, red.
    Abgr8888,
}

impl PixelLayout {
    /// Raw code of this layout with the premultiplied bit clear.
    pub const fn bits(self) -> u32 {
        let a = FormatFlags::ALPHA.bits();
        let bgr = FormatFlags::BGR.bits();
        let afirst = FormatFlags::ALPHA_FIRST.bits();
        match self {
            Self::A8 => 1 | a,
            Self::Rgb565 => 4,
            Self::Rgba4444 => 5 | a,
            Self::Rgba5551 => 6 | a,
            Self::Yuv => 7,
            Self::G8 => 8,
            Self::Rgb888 => 2,
            Self::Bgr888 => 2 | bgr,
            Self::Rgba8888 => 3 | a,
            Self::Bgra8888 => 3 | a | bgr,
            Self::Argb8888 => 3 | a | afirst,
            Self::Abgr8888 => 3 | a | bgr | afirst,
        }
    }

    /// Every layout, in raw-code order of the size class.
    pub const ALL: [Self; 12] = [
        Self::A8,
        Self::Rgb888,
        Self::Bgr888,
        Self::Rgba8888,
        Self::Bgra8888,
        Self::Argb8888,
        Self::Abgr8888,
        Self::Rgb565,
        Self::Rgba4444,
        Self::Rgba5551,
        Self::Yuv,
        Self::G8,
    ];

    /// Look up a layout by its raw code (premultiplied bit must be clear).
    pub const fn from_bits(bits: u32) -> Option<Self> {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i].bits() == bits {
                return Some(Self::ALL[i]);
            }
            i += 1;
        }
        None
    }

    /// Size class of this layout.
    pub const fn category(self) -> FormatCategory {
        match self.bits() & UNORDERED_MASK {
            8 => FormatCategory::Gray8,
            2 => FormatCategory::Packed24,
            3 => FormatCategory::Packed32,
            other => FormatCategory::Other(other as u8),
        }
    }

    /// Bytes per pixel. `Yuv` has no defined pixel size and reports 0.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::A8 | Self::G8 => 1,
            Self::Rgb565 | Self::Rgba4444 | Self::Rgba5551 => 2,
            Self::Rgb888 | Self::Bgr888 => 3,
            Self::Rgba8888 | Self::Bgra8888 | Self::Argb8888 | Self::Abgr8888 => 4,
            Self::Yuv => 0,
        }
    }

    /// Whether this layout stores alpha.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        self.bits() & FormatFlags::ALPHA.bits() != 0
    }
}

/// A pixel layout together with its premultiplication state.
///
/// Layouts without alpha are never premultiplied; the constructors
/// normalise the flag so that equality compares what is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    layout: PixelLayout,
    premultiplied: bool,
}

impl PixelFormat {
    /// 8-bit alpha mask.
    pub const A_8: Self = Self::new(PixelLayout::A8, false);
    /// 16-bit 5-6-5 RGB.
    pub const RGB_565: Self = Self::new(PixelLayout::Rgb565, false);
    /// 16-bit 4-4-4-4 RGBA.
    pub const RGBA_4444: Self = Self::new(PixelLayout::Rgba4444, false);
    /// 16-bit 5-5-5-1 RGBA.
    pub const RGBA_5551: Self = Self::new(PixelLayout::Rgba5551, false);
    /// Planar YUV.
    pub const YUV: Self = Self::new(PixelLayout::Yuv, false);
    /// 8-bit grayscale.
    pub const G_8: Self = Self::new(PixelLayout::G8, false);
    /// 24-bit RGB.
    pub const RGB_888: Self = Self::new(PixelLayout::Rgb888, false);
    /// 24-bit BGR.
    pub const BGR_888: Self = Self::new(PixelLayout::Bgr888, false);
    /// 32-bit RGBA, straight alpha.
    pub const RGBA_8888: Self = Self::new(PixelLayout::Rgba8888, false);
    /// 32-bit BGRA, straight alpha.
    pub const BGRA_8888: Self = Self::new(PixelLayout::Bgra8888, false);
    /// 32-bit ARGB, straight alpha.
    pub const ARGB_8888: Self = Self::new(PixelLayout::Argb8888, false);
    /// 32-bit ABGR, straight alpha.
    pub const ABGR_8888: Self = Self::new(PixelLayout::Abgr8888, false);
    /// 32-bit RGBA, premultiplied alpha.
    pub const RGBA_8888_PRE: Self = Self::new(PixelLayout::Rgba8888, true);
    /// 32-bit BGRA, premultiplied alpha.
    pub const BGRA_8888_PRE: Self = Self::new(PixelLayout::Bgra8888, true);
    /// 32-bit ARGB, premultiplied alpha.
    pub const ARGB_8888_PRE: Self = Self::new(PixelLayout::Argb8888, true);
    /// 32-bit ABGR, premultiplied alpha.
    pub const ABGR_8888_PRE: Self = Self::new(PixelLayout::Abgr8888, true);
    /// 16-bit 4-4-4-4 RGBA, premultiplied alpha.
    pub const RGBA_4444_PRE: Self = Self::new(PixelLayout::Rgba4444, true);
    /// 16-bit 5-5-5-1 RGBA, premultiplied alpha.
    pub const RGBA_5551_PRE: Self = Self::new(PixelLayout::Rgba5551, true);

    /// Every format this crate knows about, premultiplied variants included.
    pub const ALL: [Self; 18] = [
        Self::A_8,
        Self::RGB_565,
        Self::RGBA_4444,
        Self::RGBA_5551,
        Self::YUV,
        Self::G_8,
        Self::RGB_888,
        Self::BGR_888,
        Self::RGBA_8888,
        Self::BGRA_8888,
        Self::ARGB_8888,
        Self::ABGR_8888,
        Self::RGBA_8888_PRE,
        Self::BGRA_8888_PRE,
        Self::ARGB_8888_PRE,
        Self::ABGR_8888_PRE,
        Self::RGBA_4444_PRE,
        Self::RGBA_5551_PRE,
    ];

    /// Create a format. `premultiplied` is ignored for layouts without alpha.
    pub const fn new(layout: PixelLayout, premultiplied: bool) -> Self {
        Self {
            layout,
            premultiplied: premultiplied && layout.has_alpha(),
        }
    }

    /// Decode a raw format code.
    ///
    /// Returns `None` for reserved or unknown codes, and for codes that set
    /// the premultiplied bit on a layout without alpha.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        let premult = FormatFlags::PREMULT.bits();
        let layout = match PixelLayout::from_bits(bits & !premult) {
            Some(layout) => layout,
            None => return None,
        };
        if bits & premult != 0 && !layout.has_alpha() {
            return None;
        }
        Some(Self::new(layout, bits & premult != 0))
    }

    /// Raw format code.
    pub const fn bits(self) -> u32 {
        let premult = if self.premultiplied {
            FormatFlags::PREMULT.bits()
        } else {
            0
        };
        self.layout.bits() | premult
    }

    /// Flag bits of the raw code.
    pub const fn flags(self) -> FormatFlags {
        FormatFlags::from_bits_truncate(self.bits())
    }

    /// Channel layout.
    #[inline]
    pub const fn layout(self) -> PixelLayout {
        self.layout
    }

    /// Size class (the unordered mask of the raw code).
    #[inline]
    pub const fn category(self) -> FormatCategory {
        self.layout.category()
    }

    /// Bytes per pixel; 0 when undefined.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.layout.bytes_per_pixel()
    }

    /// Whether this format stores alpha.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        self.layout.has_alpha()
    }

    /// Whether alpha is the first byte of a 32-bit pixel.
    #[inline]
    pub const fn is_alpha_first(self) -> bool {
        self.layout.bits() & FormatFlags::ALPHA_FIRST.bits() != 0
    }

    /// Whether color channels are stored blue first.
    #[inline]
    pub const fn is_bgr(self) -> bool {
        self.layout.bits() & FormatFlags::BGR.bits() != 0
    }

    /// Whether color channels are scaled by alpha.
    #[inline]
    pub const fn is_premultiplied(self) -> bool {
        self.premultiplied
    }

    /// Same layout with the given premultiplied state.
    #[inline]
    pub const fn with_premultiplied(self, premultiplied: bool) -> Self {
        Self::new(self.layout, premultiplied)
    }

    /// Same layout with the premultiplied bit cleared.
    #[inline]
    pub const fn unpremultiplied(self) -> Self {
        self.with_premultiplied(false)
    }
}

impl From<PixelLayout> for PixelFormat {
    fn from(layout: PixelLayout) -> Self {
        Self::new(layout, false)
    }
}

impl core::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self.layout {
            PixelLayout::A8 => "A_8",
            PixelLayout::Rgb565 => "RGB_565",
            PixelLayout::Rgba4444 => "RGBA_4444",
            PixelLayout::Rgba5551 => "RGBA_5551",
            PixelLayout::Yuv => "YUV",
            PixelLayout::G8 => "G_8",
            PixelLayout::Rgb888 => "RGB_888",
            PixelLayout::Bgr888 => "BGR_888",
            PixelLayout::Rgba8888 => "RGBA_8888",
            PixelLayout::Bgra8888 => "BGRA_8888",
            PixelLayout::Argb8888 => "ARGB_8888",
            PixelLayout::Abgr8888 => "ABGR_8888",
        })?;
        if self.premultiplied {
            f.write_str("_PRE")?;
        }
        Ok(())
    }
}
