//! Per-pixel decode/encode tables and alpha arithmetic.
//!
//! Every conversion pivots through a canonical [`Rgba<u8>`]: the source
//! pixel is decoded into it, then the destination pixel is encoded from it.

use rgb::Rgba;

use crate::format::PixelLayout;

/// Decode one pixel of `layout` from the front of `src` into canonical RGBA.
///
/// Returns `None` for layouts with no decode rule. `src` must hold at least
/// `layout.bytes_per_pixel()` bytes.
#[inline]
pub fn decode(layout: PixelLayout, src: &[u8]) -> Option<Rgba<u8>> {
    let px = match layout {
        PixelLayout::G8 => Rgba::new(src[0], src[0], src[0], 255),
        PixelLayout::Rgb888 => Rgba::new(src[0], src[1], src[2], 255),
        PixelLayout::Bgr888 => Rgba::new(src[2], src[1], src[0], 255),
        PixelLayout::Rgba8888 => Rgba::new(src[0], src[1], src[2], src[3]),
        PixelLayout::Bgra8888 => Rgba::new(src[2], src[1], src[0], src[3]),
        PixelLayout::Argb8888 => Rgba::new(src[1], src[2], src[3], src[0]),
        PixelLayout::Abgr8888 => Rgba::new(src[3], src[2], src[1], src[0]),
        _ => return None,
    };
    Some(px)
}

/// Encode canonical RGBA into the front of `dst` as `layout`.
///
/// Grayscale is the truncating mean of the three color channels. Returns
/// `None` (leaving `dst` untouched) for layouts with no encode rule.
#[inline]
pub fn encode(layout: PixelLayout, px: Rgba<u8>, dst: &mut [u8]) -> Option<()> {
    match layout {
        PixelLayout::G8 => {
            dst[0] = ((px.r as u16 + px.g as u16 + px.b as u16) / 3) as u8;
        }
        PixelLayout::Rgb888 => dst[..3].copy_from_slice(&[px.r, px.g, px.b]),
        PixelLayout::Bgr888 => dst[..3].copy_from_slice(&[px.b, px.g, px.r]),
        PixelLayout::Rgba8888 => dst[..4].copy_from_slice(&[px.r, px.g, px.b, px.a]),
        PixelLayout::Bgra8888 => dst[..4].copy_from_slice(&[px.b, px.g, px.r, px.a]),
        PixelLayout::Argb8888 => dst[..4].copy_from_slice(&[px.a, px.r, px.g, px.b]),
        PixelLayout::Abgr8888 => dst[..4].copy_from_slice(&[px.a, px.b, px.g, px.r]),
        _ => return None,
    }
    Some(())
}

/// Whether `layout` has both a decode and an encode rule.
#[inline]
pub const fn has_table_entry(layout: PixelLayout) -> bool {
    matches!(
        layout,
        PixelLayout::G8
            | PixelLayout::Rgb888
            | PixelLayout::Bgr888
            | PixelLayout::Rgba8888
            | PixelLayout::Bgra8888
            | PixelLayout::Argb8888
            | PixelLayout::Abgr8888
    )
}

// ---------------------------------------------------------------------------
// Alpha arithmetic
// ---------------------------------------------------------------------------

/// `c * a / 255` without a division, rounded. Exact for `a == 0` and `a == 255`.
#[inline]
pub const fn mul_un8(c: u8, a: u8) -> u8 {
    let t = c as u32 * a as u32 + 128;
    (((t >> 8) + t) >> 8) as u8
}

/// `c * 255 / a`, saturated. `a` must be non-zero.
#[inline]
pub const fn div_un8(c: u8, a: u8) -> u8 {
    let v = c as u32 * 255 / a as u32;
    if v > 255 { 255 } else { v as u8 }
}

/// Premultiply one 4-byte pixel whose alpha is byte 3.
#[inline]
pub fn premultiply_alpha_last(px: &mut [u8]) {
    let a = px[3];
    px[0] = mul_un8(px[0], a);
    px[1] = mul_un8(px[1], a);
    px[2] = mul_un8(px[2], a);
}

/// Premultiply one 4-byte pixel whose alpha is byte 0.
#[inline]
pub fn premultiply_alpha_first(px: &mut [u8]) {
    let a = px[0];
    px[1] = mul_un8(px[1], a);
    px[2] = mul_un8(px[2], a);
    px[3] = mul_un8(px[3], a);
}

/// Unpremultiply one 4-byte pixel whose alpha is byte 3.
///
/// A fully transparent pixel is cleared to all zeros.
#[inline]
pub fn unpremultiply_alpha_last(px: &mut [u8]) {
    let a = px[3];
    if a == 0 {
        px[..4].fill(0);
        return;
    }
    px[0] = div_un8(px[0], a);
    px[1] = div_un8(px[1], a);
    px[2] = div_un8(px[2], a);
}

/// Unpremultiply one 4-byte pixel whose alpha is byte 0.
///
/// A fully transparent pixel is cleared to all zeros.
#[inline]
pub fn unpremultiply_alpha_first(px: &mut [u8]) {
    let a = px[0];
    if a == 0 {
        px[..4].fill(0);
        return;
    }
    px[1] = div_un8(px[1], a);
    px[2] = div_un8(px[2], a);
    px[3] = div_un8(px[3], a);
}
