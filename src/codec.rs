//! Layout conversion and alpha (un)premultiplication.
//!
//! The capability predicates ([`can_convert`], [`can_premultiply`],
//! [`can_unpremultiply`]) are pure and cheap. The operations re-check them
//! and reject unsupported input before touching a byte.

use log::{debug, trace};

use crate::bitmap::{Bitmap, BitmapMut, BitmapRef};
use crate::error::CodecError;
use crate::format::{FormatCategory, PixelFormat};
use crate::limits::ConvertLimits;
use crate::pixel;

/// Whether [`convert`] accepts this pair of formats.
///
/// Identical formats are rejected: callers copy instead. Otherwise both
/// formats must be 8-bit grayscale, 24-bit or 32-bit.
pub fn can_convert(src: PixelFormat, dst: PixelFormat) -> bool {
    if src == dst {
        return false;
    }
    src.category().is_decodable() && dst.category().is_encodable()
}

/// Whether [`premultiply`] accepts `format`.
///
/// Only the pixel shape is checked; whether the data is already
/// premultiplied is the caller's concern.
pub fn can_premultiply(format: PixelFormat) -> bool {
    format.category() == FormatCategory::Packed32
}

/// Whether [`unpremultiply`] accepts `format`.
pub fn can_unpremultiply(format: PixelFormat) -> bool {
    format.category() == FormatCategory::Packed32
}

fn check_conversion(src: PixelFormat, dst: PixelFormat) -> Result<(), CodecError> {
    let tabled =
        pixel::has_table_entry(src.layout()) && pixel::has_table_entry(dst.layout());
    if !can_convert(src, dst) || !tabled {
        debug!("rejecting conversion {src} -> {dst}");
        return Err(CodecError::UnsupportedConversion { src, dst });
    }
    Ok(())
}

/// Convert `src` into a newly allocated, tightly packed bitmap of `dst_format`.
///
/// The output takes its layout from `dst_format` and its premultiplied
/// state from `src`: no alpha arithmetic happens here. Use
/// [`convert_and_premult`] to also change the premultiplied state.
///
/// # Errors
///
/// [`CodecError::UnsupportedConversion`] when [`can_convert`] is false.
pub fn convert(src: &BitmapRef<'_>, dst_format: PixelFormat) -> Result<Bitmap, CodecError> {
    check_conversion(src.format(), dst_format)?;
    let out_format = dst_format.with_premultiplied(src.format().is_premultiplied());
    let mut dst = Bitmap::new(src.width(), src.height(), out_format)?;
    convert_pixels(src, &mut dst.view_mut());
    Ok(dst)
}

/// [`convert`] after checking `limits` against the source size and the
/// output allocation.
pub fn convert_with_limits(
    src: &BitmapRef<'_>,
    dst_format: PixelFormat,
    limits: &ConvertLimits,
) -> Result<Bitmap, CodecError> {
    limits.check_conversion(src, dst_format)?;
    convert(src, dst_format)
}

/// Convert `src` into an existing bitmap, honouring its row stride.
///
/// The destination's layout selects the encoding. Its premultiplied flag is
/// replaced by the source's, as with [`convert`].
///
/// # Errors
///
/// [`CodecError::DimensionMismatch`] if the sizes differ,
/// [`CodecError::UnsupportedConversion`] when [`can_convert`] is false.
pub fn convert_into(src: &BitmapRef<'_>, dst: &mut BitmapMut<'_>) -> Result<(), CodecError> {
    if (src.width(), src.height()) != (dst.width(), dst.height()) {
        return Err(CodecError::DimensionMismatch {
            src: (src.width(), src.height()),
            dst: (dst.width(), dst.height()),
        });
    }
    check_conversion(src.format(), dst.format())?;
    let out_format = dst
        .format()
        .with_premultiplied(src.format().is_premultiplied());
    dst.set_format(out_format);
    convert_pixels(src, dst);
    Ok(())
}

/// Decode every source pixel to RGBA and encode it into `dst`.
///
/// Both layouts must have table entries; `check_conversion` guarantees it.
fn convert_pixels(src: &BitmapRef<'_>, dst: &mut BitmapMut<'_>) {
    let src_layout = src.format().layout();
    let dst_layout = dst.format().layout();
    let src_bpp = src.format().bytes_per_pixel();
    let dst_bpp = dst.format().bytes_per_pixel();
    trace!(
        "converting {}x{} {} -> {}",
        src.width(),
        src.height(),
        src.format(),
        dst.format()
    );

    for y in 0..src.height() {
        let src_row = src.row(y);
        let dst_row = dst.row_mut(y);
        for (s, d) in src_row
            .chunks_exact(src_bpp)
            .zip(dst_row.chunks_exact_mut(dst_bpp))
        {
            if let Some(px) = pixel::decode(src_layout, s) {
                let _ = pixel::encode(dst_layout, px, d);
            }
        }
    }
}

/// Multiply the color channels of every pixel by its alpha, in place.
///
/// Uses the divide-free `((t >> 8) + t) >> 8` rounding with
/// `t = c * a + 128`, which is exact for `a == 255`. Alpha is unchanged.
/// On success the bitmap's format gains the premultiplied flag.
///
/// # Errors
///
/// [`CodecError::NotPremultipliable`] unless the format is 32-bit; the
/// buffer is left untouched.
pub fn premultiply(bitmap: &mut BitmapMut<'_>) -> Result<(), CodecError> {
    let format = bitmap.format();
    if !can_premultiply(format) {
        debug!("rejecting premultiply of {format}");
        return Err(CodecError::NotPremultipliable(format));
    }
    trace!("premultiplying {}x{} {format}", bitmap.width(), bitmap.height());

    let op = if format.is_alpha_first() {
        pixel::premultiply_alpha_first
    } else {
        pixel::premultiply_alpha_last
    };
    for y in 0..bitmap.height() {
        bitmap.row_mut(y).chunks_exact_mut(4).for_each(op);
    }
    bitmap.set_format(format.with_premultiplied(true));
    Ok(())
}

/// Divide the color channels of every pixel by its alpha, in place.
///
/// Pixels with zero alpha become all zeros. On success the bitmap's format
/// loses the premultiplied flag.
///
/// # Errors
///
/// [`CodecError::NotPremultipliable`] unless the format is 32-bit; the
/// buffer is left untouched.
pub fn unpremultiply(bitmap: &mut BitmapMut<'_>) -> Result<(), CodecError> {
    let format = bitmap.format();
    if !can_unpremultiply(format) {
        debug!("rejecting unpremultiply of {format}");
        return Err(CodecError::NotPremultipliable(format));
    }
    trace!(
        "unpremultiplying {}x{} {format}",
        bitmap.width(),
        bitmap.height()
    );

    let op = if format.is_alpha_first() {
        pixel::unpremultiply_alpha_first
    } else {
        pixel::unpremultiply_alpha_last
    };
    for y in 0..bitmap.height() {
        bitmap.row_mut(y).chunks_exact_mut(4).for_each(op);
    }
    bitmap.set_format(format.with_premultiplied(false));
    Ok(())
}

/// Convert `src` to exactly `dst_format`, premultiplied state included.
///
/// Straight alpha is restored before alpha is dropped or the layout
/// changes, and premultiplication is applied after the layout change. A
/// request for the source's own format returns a packed copy.
///
/// # Errors
///
/// [`CodecError::UnsupportedConversion`] when the layouts cannot be
/// converted, [`CodecError::NotPremultipliable`] when the premultiplied
/// state would have to change on a format that does not support it.
pub fn convert_and_premult(
    src: &BitmapRef<'_>,
    dst_format: PixelFormat,
) -> Result<Bitmap, CodecError> {
    let src_format = src.format();
    let needs_unpremult = src_format.is_premultiplied() && !dst_format.is_premultiplied();
    let needs_premult = !src_format.is_premultiplied() && dst_format.is_premultiplied();

    let straight;
    let mut src = *src;
    if needs_unpremult {
        let mut copy = src.to_bitmap();
        copy.unpremultiply()?;
        straight = copy;
        src = straight.view();
    }

    let mut out = if src.format().layout() != dst_format.layout() {
        convert(&src, dst_format)?
    } else {
        src.to_bitmap()
    };

    if needs_premult {
        out.premultiply()?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn rgba(data: &[u8], width: u32) -> BitmapRef<'_> {
        let height = (data.len() / 4) as u32 / width;
        BitmapRef::new(data, width, height, width as usize * 4, PixelFormat::RGBA_8888).unwrap()
    }

    #[test]
    fn can_convert_rejects_identity() {
        for format in PixelFormat::ALL {
            assert!(!can_convert(format, format), "{format}");
        }
    }

    #[test]
    fn can_convert_categories() {
        assert!(can_convert(PixelFormat::G_8, PixelFormat::RGBA_8888));
        assert!(can_convert(PixelFormat::RGB_888, PixelFormat::G_8));
        assert!(can_convert(PixelFormat::ARGB_8888, PixelFormat::BGR_888));
        // Differs only in premultiplied state.
        assert!(can_convert(PixelFormat::RGBA_8888, PixelFormat::RGBA_8888_PRE));

        assert!(!can_convert(PixelFormat::A_8, PixelFormat::RGBA_8888));
        assert!(!can_convert(PixelFormat::RGBA_8888, PixelFormat::A_8));
        assert!(!can_convert(PixelFormat::RGB_565, PixelFormat::RGB_888));
        assert!(!can_convert(PixelFormat::RGBA_8888, PixelFormat::RGBA_4444_PRE));
        assert!(!can_convert(PixelFormat::YUV, PixelFormat::G_8));
    }

    #[test]
    fn premultiply_capability() {
        for format in PixelFormat::ALL {
            let expected = format.category() == FormatCategory::Packed32;
            assert_eq!(can_premultiply(format), expected, "{format}");
            assert_eq!(can_unpremultiply(format), expected, "{format}");
        }
        assert!(!can_premultiply(PixelFormat::G_8));
        assert!(!can_unpremultiply(PixelFormat::BGR_888));
        assert!(can_premultiply(PixelFormat::ABGR_8888_PRE));
    }

    #[test]
    fn convert_rejects_unsupported() {
        let data = [0u8; 4];
        let src = rgba(&data, 1);
        assert_eq!(
            convert(&src, PixelFormat::RGBA_8888).unwrap_err(),
            CodecError::UnsupportedConversion {
                src: PixelFormat::RGBA_8888,
                dst: PixelFormat::RGBA_8888
            }
        );
        assert!(convert(&src, PixelFormat::RGB_565).is_err());
    }

    #[test]
    fn convert_to_gray_truncates() {
        let data = [30u8, 60, 90, 255];
        let out = convert(&rgba(&data, 1), PixelFormat::G_8).unwrap();
        assert_eq!(out.data(), &[60]);
        assert_eq!(out.format(), PixelFormat::G_8);
    }

    #[test]
    fn convert_gray_expands() {
        let data = [7u8, 200];
        let src = BitmapRef::new(&data, 2, 1, 2, PixelFormat::G_8).unwrap();
        let out = convert(&src, PixelFormat::ARGB_8888).unwrap();
        assert_eq!(out.data(), &[255, 7, 7, 7, 255, 200, 200, 200]);
        assert_eq!(out.rowstride(), 8);
    }

    #[test]
    fn convert_honours_source_padding() {
        // 2x2 BGR with 2 bytes of padding per row.
        let data = [
            3u8, 2, 1, 6, 5, 4, 0xEE, 0xEE, //
            9, 8, 7, 12, 11, 10, 0xEE, 0xEE,
        ];
        let src = BitmapRef::new(&data, 2, 2, 8, PixelFormat::BGR_888).unwrap();
        let out = convert(&src, PixelFormat::RGB_888).unwrap();
        assert_eq!(out.rowstride(), 6);
        assert_eq!(out.data(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn convert_inherits_premultiplied_state() {
        let data = [10u8, 20, 30, 40];
        let src = BitmapRef::new(&data, 1, 1, 4, PixelFormat::RGBA_8888_PRE).unwrap();
        let out = convert(&src, PixelFormat::BGRA_8888).unwrap();
        assert_eq!(out.format(), PixelFormat::BGRA_8888_PRE);
        assert_eq!(out.data(), &[30, 20, 10, 40]);

        let out = convert(&rgba(&data, 1), PixelFormat::ABGR_8888_PRE).unwrap();
        assert_eq!(out.format(), PixelFormat::ABGR_8888);
        assert_eq!(out.data(), &[40, 30, 20, 10]);
    }

    #[test]
    fn convert_does_not_touch_source() {
        let data = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let before = data.clone();
        let _ = convert(&rgba(&data, 2), PixelFormat::RGB_888).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn convert_into_padded_destination() {
        let data = [1u8, 2, 3, 4];
        let mut out = vec![0xAAu8; 5];
        let mut dst = BitmapMut::new(&mut out, 1, 1, 5, PixelFormat::BGR_888).unwrap();
        convert_into(&rgba(&data, 1), &mut dst).unwrap();
        assert_eq!(dst.format(), PixelFormat::BGR_888);
        assert_eq!(out, [3, 2, 1, 0xAA, 0xAA]);
    }

    #[test]
    fn convert_into_checks_dimensions() {
        let data = [0u8; 8];
        let mut out = [0u8; 3];
        let mut dst = BitmapMut::new(&mut out, 1, 1, 3, PixelFormat::RGB_888).unwrap();
        assert_eq!(
            convert_into(&rgba(&data, 2), &mut dst).unwrap_err(),
            CodecError::DimensionMismatch {
                src: (2, 1),
                dst: (1, 1)
            }
        );
    }

    #[test]
    fn convert_with_limits_rejects_before_allocating() {
        let data = [0u8; 16];
        let limits = ConvertLimits::none().with_max_pixels(3);
        assert!(matches!(
            convert_with_limits(&rgba(&data, 2), PixelFormat::RGB_888, &limits),
            Err(CodecError::Limit(_))
        ));
        let limits = ConvertLimits::none().with_max_pixels(4);
        assert!(convert_with_limits(&rgba(&data, 2), PixelFormat::RGB_888, &limits).is_ok());
    }

    #[test]
    fn premultiply_two_pixels() {
        let mut data = [255u8, 0, 0, 128, 0, 255, 0, 64];
        let mut bmp =
            BitmapMut::new(&mut data, 2, 1, 8, PixelFormat::RGBA_8888).unwrap();
        premultiply(&mut bmp).unwrap();
        assert_eq!(bmp.format(), PixelFormat::RGBA_8888_PRE);
        assert_eq!(data, [128, 0, 0, 128, 0, 64, 0, 64]);
    }

    #[test]
    fn premultiply_alpha_first_layout() {
        let mut data = [128u8, 255, 0, 0];
        let mut bmp = BitmapMut::new(&mut data, 1, 1, 4, PixelFormat::ARGB_8888).unwrap();
        premultiply(&mut bmp).unwrap();
        assert_eq!(bmp.format(), PixelFormat::ARGB_8888_PRE);
        assert_eq!(data, [128, 128, 0, 0]);
    }

    #[test]
    fn premultiply_skips_row_padding() {
        let mut data = [200u8, 200, 200, 0, 0xEE, 0xEE, 100, 100, 100, 0];
        let mut bmp = BitmapMut::new(&mut data, 1, 2, 6, PixelFormat::BGRA_8888).unwrap();
        premultiply(&mut bmp).unwrap();
        assert_eq!(data, [0, 0, 0, 0, 0xEE, 0xEE, 0, 0, 0, 0]);
    }

    #[test]
    fn premultiply_rejects_non_32_bit() {
        let mut data = [9u8, 9, 9];
        let mut bmp = BitmapMut::new(&mut data, 1, 1, 3, PixelFormat::RGB_888).unwrap();
        assert_eq!(
            premultiply(&mut bmp).unwrap_err(),
            CodecError::NotPremultipliable(PixelFormat::RGB_888)
        );
        assert_eq!(
            unpremultiply(&mut bmp).unwrap_err(),
            CodecError::NotPremultipliable(PixelFormat::RGB_888)
        );
        assert_eq!(bmp.format(), PixelFormat::RGB_888);
        assert_eq!(data, [9, 9, 9]);
    }

    #[test]
    fn unpremultiply_zero_alpha_clears_pixel() {
        let mut data = [10u8, 20, 30, 0, 0, 40, 50, 60];
        let mut bmp =
            BitmapMut::new(&mut data, 2, 1, 8, PixelFormat::RGBA_8888_PRE).unwrap();
        unpremultiply(&mut bmp).unwrap();
        assert_eq!(bmp.format(), PixelFormat::RGBA_8888);
        assert_eq!(&data[..4], &[0, 0, 0, 0]);
        assert_eq!(&data[4..], &[0, 170, 212, 60]);
    }

    #[test]
    fn opaque_round_trip_is_exact() {
        let original: Vec<u8> = (0..=255u8)
            .flat_map(|c| [c, 255 - c, c / 2, 255])
            .collect();
        let mut data = original.clone();
        let mut bmp = BitmapMut::new(&mut data, 256, 1, 1024, PixelFormat::RGBA_8888).unwrap();
        premultiply(&mut bmp).unwrap();
        unpremultiply(&mut bmp).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn convert_and_premult_premultiplies_after_swizzle() {
        let data = [255u8, 0, 0, 128];
        let out = convert_and_premult(&rgba(&data, 1), PixelFormat::BGRA_8888_PRE).unwrap();
        assert_eq!(out.format(), PixelFormat::BGRA_8888_PRE);
        assert_eq!(out.data(), &[0, 0, 128, 128]);
    }

    #[test]
    fn convert_and_premult_unpremultiplies_before_dropping_alpha() {
        let data = [64u8, 0, 0, 128];
        let src = BitmapRef::new(&data, 1, 1, 4, PixelFormat::RGBA_8888_PRE).unwrap();
        let out = convert_and_premult(&src, PixelFormat::RGB_888).unwrap();
        assert_eq!(out.format(), PixelFormat::RGB_888);
        assert_eq!(out.data(), &[127, 0, 0]);
    }

    #[test]
    fn convert_and_premult_same_layout() {
        let data = [255u8, 255, 255, 0];
        let out = convert_and_premult(&rgba(&data, 1), PixelFormat::RGBA_8888_PRE).unwrap();
        assert_eq!(out.format(), PixelFormat::RGBA_8888_PRE);
        assert_eq!(out.data(), &[0, 0, 0, 0]);

        let copy = convert_and_premult(&rgba(&data, 1), PixelFormat::RGBA_8888).unwrap();
        assert_eq!(copy.data(), &data);
    }

    #[test]
    fn convert_and_premult_rejects_unsupported() {
        let data = [0u8; 2];
        let src = BitmapRef::new(&data, 1, 1, 2, PixelFormat::RGBA_4444_PRE).unwrap();
        assert_eq!(
            convert_and_premult(&src, PixelFormat::RGBA_8888).unwrap_err(),
            CodecError::NotPremultipliable(PixelFormat::RGBA_4444_PRE)
        );
    }
}
