//! Building icon families from arbitrary source images.
//!
//! Resampling is delegated to a [`Resampler`]; with the `resize` feature
//! enabled, [`FastResampler`] provides one backed by `fast_image_resize`.

use std::collections::BTreeMap;
use tracing::debug;

use super::error::{ExternalError, IconError, Result};
use super::family::IconFamily;
use super::icontype::{ElementRole, IconElementTypeDescriptor, OSType};
use super::image::Bitmap;

/// How much smoothing to apply when resampling.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Interpolation {
    /// Nearest neighbor; no smoothing.
    None,
    /// Bilinear filtering.
    Low,
    /// Bicubic (Catmull-Rom) filtering.
    Medium,
    /// Lanczos filtering.
    High,
}

impl Default for Interpolation {
    fn default() -> Interpolation {
        Interpolation::High
    }
}

/// Scales images to the pixel sizes an icon family needs.
pub trait Resampler {
    /// Returns a `width` x `height` copy of `source`.  The result must use
    /// one of the 8-bit interleaved pixel formats.
    fn resample(&self,
                source: &Bitmap,
                width: u32,
                height: u32,
                quality: Interpolation)
                -> std::result::Result<Bitmap, ExternalError>;
}

/// Which elements [`IconFamily::from_thumbnails`] generates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThumbnailOptions {
    /// Smoothing passed to the resampler.
    pub interpolation: Interpolation,
    /// Logical icon sizes to generate; each must be in the registry.
    pub sizes: Vec<u32>,
    /// Also generate the 2x variant of each size that has one.
    pub retina: bool,
    /// Also generate legacy color and 8-bit mask elements where the size
    /// has them.
    pub legacy_elements: bool,
    /// Also generate legacy 1-bit masks.  Some consumers reject families
    /// carrying freshly written 1-bit masks, so this is off by default.
    pub legacy_1bit_masks: bool,
}

impl Default for ThumbnailOptions {
    fn default() -> ThumbnailOptions {
        ThumbnailOptions {
            interpolation: Interpolation::High,
            sizes: vec![16, 32, 128, 256, 512],
            retina: true,
            legacy_elements: true,
            legacy_1bit_masks: false,
        }
    }
}

impl ThumbnailOptions {
    /// Lists the OSTypes to generate, grouped by pixel size.
    fn plan(&self) -> Result<BTreeMap<u32, Vec<OSType>>> {
        let mut plan: BTreeMap<u32, Vec<OSType>> = BTreeMap::new();
        for &size in &self.sizes {
            let entry = IconElementTypeDescriptor::lookup(size, false)?;
            let mut one_x = vec![entry.argb];
            if self.legacy_elements {
                one_x.extend(entry.ostype(ElementRole::Rgb));
                one_x.extend(entry.ostype(ElementRole::Mask8));
            }
            if self.legacy_1bit_masks {
                one_x.extend(entry.ostype(ElementRole::Mask1));
            }
            plan.entry(size).or_insert_with(Vec::new).extend(one_x);
            if self.retina {
                if let Some(retina) = entry.retina {
                    plan.entry(size * 2).or_insert_with(Vec::new).push(retina);
                }
            }
        }
        Ok(plan)
    }
}

impl IconFamily {
    /// Creates an icon family from a source image of any size, resampling it
    /// once per pixel size required by `options`.
    ///
    /// Elements are added from the largest pixel size down.  Resampler
    /// failures are reported as [`IconError::Resample`].
    pub fn from_thumbnails<R: Resampler + ?Sized>(source: &Bitmap,
                                                  resampler: &R,
                                                  options: &ThumbnailOptions)
                                                  -> Result<IconFamily> {
        let plan = options.plan()?;
        let mut family = IconFamily::new();
        for (&pixels, ostypes) in plan.iter().rev() {
            debug!(pixels,
                   source_width = source.width(),
                   source_height = source.height(),
                   quality = ?options.interpolation,
                   "resampling icon thumbnail");
            let bitmap = resampler.resample(source,
                                            pixels,
                                            pixels,
                                            options.interpolation)
                .map_err(IconError::Resample)?;
            if bitmap.width() != pixels || bitmap.height() != pixels ||
               bitmap.pixel_format().is_none() {
                let msg = format!("resampler returned a {}x{} bitmap with {} \
                                   bits per sample for a {}x{} request",
                                  bitmap.width(),
                                  bitmap.height(),
                                  bitmap.bits_per_sample(),
                                  pixels,
                                  pixels);
                return Err(IconError::Resample(msg.into()));
            }
            for &ostype in ostypes {
                family.set_icon_element(ostype, &bitmap)?;
            }
        }
        Ok(family)
    }
}

#[cfg(feature = "resize")]
pub use self::fast::FastResampler;

#[cfg(feature = "resize")]
mod fast {
    use fast_image_resize::images::{Image, ImageRef};
    use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions,
                            Resizer};

    use super::{Interpolation, Resampler};
    use super::super::error::ExternalError;
    use super::super::image::{Bitmap, PixelFormat};

    /// A [`Resampler`] built on `fast_image_resize`.  Output is always RGBA.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct FastResampler;

    impl FastResampler {
        /// Creates a new resampler.
        pub fn new() -> FastResampler {
            FastResampler
        }
    }

    fn resize_alg(quality: Interpolation) -> ResizeAlg {
        match quality {
            Interpolation::None => ResizeAlg::Nearest,
            Interpolation::Low => ResizeAlg::Convolution(FilterType::Bilinear),
            Interpolation::Medium => {
                ResizeAlg::Convolution(FilterType::CatmullRom)
            }
            Interpolation::High => ResizeAlg::Convolution(FilterType::Lanczos3),
        }
    }

    impl Resampler for FastResampler {
        fn resample(&self,
                    source: &Bitmap,
                    width: u32,
                    height: u32,
                    quality: Interpolation)
                    -> Result<Bitmap, ExternalError> {
            let rgba = source.to_rgba()?;
            let src = ImageRef::new(rgba.width(),
                                    rgba.height(),
                                    rgba.data(),
                                    PixelType::U8x4)?;
            let mut dst = Image::new(width, height, PixelType::U8x4);
            let options = ResizeOptions::new().resize_alg(resize_alg(quality));
            Resizer::new().resize(&src, &mut dst, &options)?;
            Ok(Bitmap::from_data(PixelFormat::RGBA, width, height, dst.into_vec())?)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn resample_solid_color() {
            let mut source = Bitmap::new(PixelFormat::RGB, 40, 40);
            for pixel in source.data_mut().chunks_mut(3) {
                pixel.copy_from_slice(&[10, 20, 30]);
            }
            let scaled = FastResampler::new()
                .resample(&source, 16, 16, Interpolation::None)
                .unwrap();
            assert_eq!(scaled.width(), 16);
            assert_eq!(scaled.pixel_format(), Some(PixelFormat::RGBA));
            assert!(scaled.data().chunks(4).all(|p| p == [10, 20, 30, 255]));

            let scaled = FastResampler::new()
                .resample(&source, 64, 64, Interpolation::High)
                .unwrap();
            assert_eq!((scaled.width(), scaled.height()), (64, 64));
        }
    }
}
