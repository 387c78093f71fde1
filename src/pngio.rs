use std::io::{BufRead, Seek, Write};

use super::error::{IconError, Result};
use super::image::{Bitmap, BitmapLayout, PixelFormat};

fn decoding_error(err: png::DecodingError) -> IconError {
    match err {
        png::DecodingError::IoError(err) => IconError::Io(err),
        other => IconError::corrupt(format!("invalid PNG: {}", other)),
    }
}

fn encoding_error(err: png::EncodingError) -> IconError {
    match err {
        png::EncodingError::IoError(err) => IconError::Io(err),
        other => IconError::invalid_bitmap(format!("cannot encode PNG: {}", other)),
    }
}

impl Bitmap {
    /// Reads a bitmap from a PNG file.  Grayscale-with-alpha images are
    /// expanded to RGBA, since icon elements have no such format.
    pub fn read_png<R: BufRead + Seek>(input: R) -> Result<Bitmap> {
        Bitmap::read_png_limited(input, None)
    }

    /// Like `read_png`, but fails before allocating any pixel storage if the
    /// PNG header does not declare exactly `expected` (width, height).
    pub(crate) fn read_png_limited<R: BufRead + Seek>(input: R,
                                                      expected: Option<(u32, u32)>)
                                                      -> Result<Bitmap> {
        let mut decoder = png::Decoder::new(input);
        decoder.set_transformations(
            png::Transformations::STRIP_16 | png::Transformations::EXPAND,
        );
        let info = decoder.read_header_info().map_err(decoding_error)?;
        let (width, height) = (info.width, info.height);
        if let Some((expected_width, expected_height)) = expected {
            if (width, height) != (expected_width, expected_height) {
                let msg = format!("PNG header declares {}x{} pixels instead \
                                   of {}x{}",
                                  width,
                                  height,
                                  expected_width,
                                  expected_height);
                return Err(IconError::corrupt(msg));
            }
        }
        let mut reader = decoder.read_info().map_err(decoding_error)?;

        let (color_type, bit_depth) = reader.output_color_type();
        if bit_depth != png::BitDepth::Eight {
            return Err(IconError::corrupt("PNG did not expand to 8-bit samples"));
        }
        let samples_per_pixel = match color_type {
            png::ColorType::Rgba => 4,
            png::ColorType::Rgb => 3,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Grayscale => 1,
            // EXPAND prevents paletted output
            png::ColorType::Indexed => {
                return Err(IconError::corrupt("unexpected indexed PNG output"));
            }
        };
        let bytes_per_row = samples_per_pixel * width as usize;
        let mut data = vec![0u8; bytes_per_row * height as usize];
        reader.next_frame(&mut data).map_err(decoding_error)?;
        reader.finish().map_err(decoding_error)?;

        if samples_per_pixel == 2 {
            let mut rgba = Vec::with_capacity(data.len() * 2);
            for ga in data.chunks(2) {
                rgba.extend_from_slice(&[ga[0], ga[0], ga[0], ga[1]]);
            }
            return Bitmap::from_data(PixelFormat::RGBA, width, height, rgba);
        }
        let layout = BitmapLayout {
            width: width,
            height: height,
            samples_per_pixel: samples_per_pixel as u32,
            bits_per_sample: 8,
            planar: false,
            bytes_per_row: bytes_per_row,
        };
        Bitmap::with_layout(layout, data)
    }

    /// Writes the bitmap to a PNG file.
    pub fn write_png<W: Write>(&self, output: W) -> Result<()> {
        let format = self.pixel_format().ok_or_else(|| {
            IconError::invalid_bitmap("only 8-bit interleaved bitmaps can be \
                                       written as PNG")
        })?;
        let color_type = match format {
            PixelFormat::RGBA => png::ColorType::Rgba,
            PixelFormat::RGB => png::ColorType::Rgb,
            PixelFormat::Gray => png::ColorType::Grayscale,
        };
        let mut packed = Vec::with_capacity(self.bytes_per_row() *
                                            self.height() as usize);
        for pixel in self.pixels() {
            packed.extend_from_slice(pixel);
        }
        let mut encoder = png::Encoder::new(output, self.width(), self.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(encoding_error)?;
        writer.write_image_data(&packed).map_err(encoding_error)?;
        writer.finish().map_err(encoding_error)?;
        Ok(())
    }
}
