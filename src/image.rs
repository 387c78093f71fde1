use super::error::{IconError, Result};

/// A bitmap in memory: the working representation that elements are encoded
/// from and decoded into.
///
/// Pixel data is addressed row-major, with `bytes_per_row` bytes between the
/// starts of consecutive rows (which may include padding).  Planar bitmaps
/// store one such plane per sample, one after another.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    bits_per_sample: u32,
    planar: bool,
    bytes_per_row: usize,
    data: Box<[u8]>,
}

impl Bitmap {
    /// Creates a new, tightly packed bitmap with all pixel data set to zero.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Bitmap {
        let bytes_per_row = format.bytes_per_pixel() * width as usize;
        Bitmap {
            width: width,
            height: height,
            samples_per_pixel: format.samples_per_pixel(),
            bits_per_sample: 8,
            planar: false,
            bytes_per_row: bytes_per_row,
            data: vec![0u8; bytes_per_row * height as usize].into_boxed_slice(),
        }
    }

    /// Creates a tightly packed bitmap from existing pixel data.  Returns an
    /// error if the data length does not match the dimensions.
    pub fn from_data(format: PixelFormat,
                     width: u32,
                     height: u32,
                     data: Vec<u8>)
                     -> Result<Bitmap> {
        let layout = BitmapLayout::packed(format, width, height);
        Bitmap::with_layout(layout, data)
    }

    /// Creates a bitmap with an arbitrary memory layout, as handed over by an
    /// image loader.  Only the buffer length is checked here; whether the
    /// layout can be stored in an icon element is checked when encoding.
    pub fn with_layout(layout: BitmapLayout, data: Vec<u8>) -> Result<Bitmap> {
        if layout.bits_per_sample == 0 || layout.samples_per_pixel == 0 {
            return Err(IconError::invalid_bitmap("empty pixel layout"));
        }
        let planes = if layout.planar {
            layout.samples_per_pixel as usize
        } else {
            1
        };
        let overflow = || IconError::invalid_bitmap("pixel layout is too large");
        let samples_per_row = if layout.planar {
            1
        } else {
            layout.samples_per_pixel as usize
        };
        let row_bits = (layout.bits_per_sample as usize)
            .checked_mul(samples_per_row)
            .and_then(|bits| bits.checked_mul(layout.width as usize))
            .ok_or_else(overflow)?;
        let stride_bits = layout.bytes_per_row.checked_mul(8).ok_or_else(overflow)?;
        if stride_bits < row_bits {
            let msg = format!("row stride of {} bytes is too small for {} \
                               pixels",
                              layout.bytes_per_row,
                              layout.width);
            return Err(IconError::invalid_bitmap(msg));
        }
        let required = layout.bytes_per_row
            .checked_mul(layout.height as usize)
            .and_then(|bytes| bytes.checked_mul(planes))
            .ok_or_else(overflow)?;
        if data.len() < required {
            let msg = format!("pixel buffer holds {} bytes, {} required",
                              data.len(),
                              required);
            return Err(IconError::invalid_bitmap(msg));
        }
        Ok(Bitmap {
            width: layout.width,
            height: layout.height,
            samples_per_pixel: layout.samples_per_pixel,
            bits_per_sample: layout.bits_per_sample,
            planar: layout.planar,
            bytes_per_row: layout.bytes_per_row,
            data: data.into_boxed_slice(),
        })
    }

    /// Returns the pixel format of this bitmap, or `None` if its layout is
    /// not one of the 8-bit interleaved formats.
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        if self.bits_per_sample != 8 || self.planar {
            return None;
        }
        PixelFormat::from_samples_per_pixel(self.samples_per_pixel)
    }

    /// Returns the width of the bitmap, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the bitmap, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of samples stored for each pixel.
    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Returns the number of bits per sample.
    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    /// Returns true if samples are stored in separate planes.
    pub fn is_planar(&self) -> bool {
        self.planar
    }

    /// Returns the distance between the starts of two rows, in bytes.
    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// Returns a reference to the bitmap's pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the bitmap's pixel data.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the samples of the pixel at (`x`, `y`), or `None` if the
    /// coordinates are out of range or the bitmap is not 8-bit interleaved.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height || self.pixel_format().is_none() {
            return None;
        }
        let spp = self.samples_per_pixel as usize;
        let start = y as usize * self.bytes_per_row + x as usize * spp;
        self.data.get(start..start + spp)
    }

    /// Iterates over the pixels of an 8-bit interleaved bitmap in row-major
    /// order, skipping any row padding.
    pub(crate) fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let spp = self.samples_per_pixel as usize;
        let row_len = spp * self.width as usize;
        self.data
            .chunks(self.bytes_per_row.max(1))
            .take(self.height as usize)
            .flat_map(move |row| row[..row_len].chunks(spp))
    }

    /// Checks that this bitmap can be stored in an element of the given
    /// pixel size: 8 bits per sample, interleaved, 1, 3 or 4 samples per
    /// pixel, and exactly `size` x `size` pixels.
    pub(crate) fn check_encodable(&self, size: u32) -> Result<PixelFormat> {
        if self.bits_per_sample != 8 {
            let msg = format!("{} bits per sample (must be 8)",
                              self.bits_per_sample);
            return Err(IconError::invalid_bitmap(msg));
        }
        if self.planar {
            return Err(IconError::invalid_bitmap("planar bitmaps are not \
                                                  supported"));
        }
        let format = PixelFormat::from_samples_per_pixel(self.samples_per_pixel)
            .ok_or_else(|| {
                let msg = format!("{} samples per pixel (must be 1, 3 or 4)",
                                  self.samples_per_pixel);
                IconError::invalid_bitmap(msg)
            })?;
        if self.width != self.height {
            let msg = format!("bitmap is not square ({}x{})",
                              self.width,
                              self.height);
            return Err(IconError::invalid_bitmap(msg));
        }
        if self.width != size {
            let msg = format!("bitmap has wrong dimensions ({}x{} instead of \
                               {}x{})",
                              self.width,
                              self.height,
                              size,
                              size);
            return Err(IconError::invalid_bitmap(msg));
        }
        Ok(format)
    }

    /// Creates a tightly packed RGBA copy of this bitmap.  Bitmaps without
    /// alpha become fully opaque.  Returns an error for layouts other than
    /// the 8-bit interleaved formats.
    pub fn to_rgba(&self) -> Result<Bitmap> {
        let format = self.pixel_format().ok_or_else(|| {
            IconError::invalid_bitmap("only 8-bit interleaved bitmaps can be \
                                       converted")
        })?;
        let mut rgba = Vec::with_capacity(self.width as usize *
                                          self.height as usize * 4);
        for pixel in self.pixels() {
            match format {
                PixelFormat::RGBA => rgba.extend_from_slice(pixel),
                PixelFormat::RGB => {
                    rgba.extend_from_slice(pixel);
                    rgba.push(u8::MAX);
                }
                PixelFormat::Gray => {
                    rgba.extend_from_slice(&[pixel[0], pixel[0], pixel[0]]);
                    rgba.push(u8::MAX);
                }
            }
        }
        Bitmap::from_data(PixelFormat::RGBA, self.width, self.height, rgba)
    }
}

/// Memory layout of a bitmap's pixel data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BitmapLayout {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of samples per pixel.
    pub samples_per_pixel: u32,
    /// Number of bits per sample.
    pub bits_per_sample: u32,
    /// Whether samples are stored in separate planes.
    pub planar: bool,
    /// Bytes from the start of one row to the next.
    pub bytes_per_row: usize,
}

impl BitmapLayout {
    /// The layout of a tightly packed 8-bit interleaved bitmap.
    pub fn packed(format: PixelFormat, width: u32, height: u32) -> BitmapLayout {
        BitmapLayout {
            width: width,
            height: height,
            samples_per_pixel: format.samples_per_pixel(),
            bits_per_sample: 8,
            planar: false,
            bytes_per_row: format.bytes_per_pixel() * width as usize,
        }
    }
}

/// A format for storing 8-bit interleaved pixel data in a bitmap.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
    /// 32-bit color with alpha channel (non-premultiplied).
    RGBA,
    /// 24-bit color with no alpha.
    RGB,
    /// 8-bit grayscale (or intensity) with no alpha.
    Gray,
}

impl PixelFormat {
    /// Returns the number of samples stored for each pixel in this format.
    pub fn samples_per_pixel(self) -> u32 {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::RGB => 3,
            PixelFormat::Gray => 1,
        }
    }

    /// Returns the number of bytes needed to store a single pixel in this
    /// format.
    pub fn bytes_per_pixel(self) -> usize {
        self.samples_per_pixel() as usize
    }

    fn from_samples_per_pixel(samples: u32) -> Option<PixelFormat> {
        match samples {
            4 => Some(PixelFormat::RGBA),
            3 => Some(PixelFormat::RGB),
            1 => Some(PixelFormat::Gray),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_to_rgba_is_opaque() {
        let image = Bitmap::from_data(PixelFormat::RGB, 2, 1, vec![1, 2, 3, 4, 5, 6])
            .unwrap();
        let rgba = image.to_rgba().unwrap();
        assert_eq!(rgba.pixel_format(), Some(PixelFormat::RGBA));
        assert_eq!(rgba.data(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn gray_to_rgba() {
        let image = Bitmap::from_data(PixelFormat::Gray, 2, 1, vec![7, 200]).unwrap();
        let rgba = image.to_rgba().unwrap();
        assert_eq!(rgba.data(), &[7, 7, 7, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn padded_rows_are_skipped() {
        let layout = BitmapLayout {
            bytes_per_row: 4,
            ..BitmapLayout::packed(PixelFormat::Gray, 2, 2)
        };
        let image = Bitmap::with_layout(layout, vec![1, 2, 0xee, 0xee, 3, 4, 0xee, 0xee])
            .unwrap();
        let gray: Vec<u8> = image.pixels().map(|p| p[0]).collect();
        assert_eq!(gray, vec![1, 2, 3, 4]);
        assert_eq!(image.pixel(1, 1), Some(&[4u8][..]));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(image.pixel(0, 2), None);
    }

    #[test]
    fn layout_checks_buffer_length() {
        assert!(Bitmap::from_data(PixelFormat::RGBA, 2, 2, vec![0; 15]).is_err());
        let layout = BitmapLayout {
            bytes_per_row: 3,
            ..BitmapLayout::packed(PixelFormat::RGB, 2, 1)
        };
        assert!(Bitmap::with_layout(layout, vec![0; 6]).is_err());
    }

    #[test]
    fn oversized_layout_is_rejected() {
        let huge_stride = BitmapLayout {
            bytes_per_row: usize::MAX / 4,
            ..BitmapLayout::packed(PixelFormat::Gray, 16, 16)
        };
        match Bitmap::with_layout(huge_stride, vec![0; 256]) {
            Err(IconError::InvalidBitmap(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        let huge_rows = BitmapLayout {
            bytes_per_row: usize::MAX / 16,
            height: u32::MAX,
            ..BitmapLayout::packed(PixelFormat::Gray, 16, 16)
        };
        match Bitmap::with_layout(huge_rows, vec![0; 256]) {
            Err(IconError::InvalidBitmap(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn pixel_of_non_interleaved_bitmap_is_none() {
        let planar = BitmapLayout {
            planar: true,
            bytes_per_row: 2,
            ..BitmapLayout::packed(PixelFormat::RGB, 2, 2)
        };
        let image = Bitmap::with_layout(planar, vec![0; 12]).unwrap();
        assert_eq!(image.pixel(0, 0), None);
    }

    #[test]
    fn encodable_preconditions() {
        let image = Bitmap::new(PixelFormat::RGB, 16, 16);
        assert_eq!(image.check_encodable(16).unwrap(), PixelFormat::RGB);
        assert!(image.check_encodable(32).is_err());
        assert!(Bitmap::new(PixelFormat::RGBA, 16, 32).check_encodable(16).is_err());

        let sixteen_bit = BitmapLayout {
            bits_per_sample: 16,
            bytes_per_row: 16 * 8,
            ..BitmapLayout::packed(PixelFormat::RGBA, 16, 16)
        };
        let image = Bitmap::with_layout(sixteen_bit, vec![0; 16 * 16 * 8]).unwrap();
        assert!(image.pixel_format().is_none());
        assert!(image.check_encodable(16).is_err());

        let planar = BitmapLayout {
            planar: true,
            bytes_per_row: 16,
            ..BitmapLayout::packed(PixelFormat::RGB, 16, 16)
        };
        let image = Bitmap::with_layout(planar, vec![0; 16 * 16 * 3]).unwrap();
        assert!(image.is_planar());
        assert!(image.check_encodable(16).is_err());
    }
}
