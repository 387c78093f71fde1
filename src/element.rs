use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use super::error::{IconError, Result};
use super::icontype::{ElementRole, ElementType, OSType};
use super::image::{Bitmap, PixelFormat};

/// The length of an icon element header, in bytes:
pub(crate) const ICON_ELEMENT_HEADER_LENGTH: u32 = 8;

/// Mask samples at or above this value set the bit in a 1-bit mask.
const MASK1_THRESHOLD: u8 = 128;

/// The signature at the start of a PNG payload.
#[cfg(feature = "pngio")]
const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// One entry in an icon family.  Depending on the OSType, this may represent
/// a whole icon, or part of an icon (such as a legacy mask, or color data
/// without the mask).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconElement {
    ostype: OSType,
    data: Vec<u8>,
}

impl IconElement {
    /// Creates an icon element with the given OSType and data payload.
    pub fn new(ostype: OSType, data: Vec<u8>) -> IconElement {
        IconElement {
            ostype: ostype,
            data: data,
        }
    }

    /// Encodes a bitmap into a new element of the given type.
    ///
    /// The bitmap must have 8 bits per sample, be non-planar, have 1, 3 or 4
    /// samples per pixel, and be exactly as large as the element type's
    /// pixel size.  ARGB elements synthesize an opaque alpha channel for
    /// bitmaps without one; mask elements take their samples from the alpha
    /// channel, or from the gray channel of a 1-sample bitmap.
    pub fn encode(ostype: OSType, bitmap: &Bitmap) -> Result<IconElement> {
        let element_type = ElementType::from_ostype(ostype)
            .map_err(|_| IconError::UnsupportedElementType(ostype))?;
        let size = element_type.pixel_size();
        let format = bitmap.check_encodable(size)?;
        let num_pixels = (size * size) as usize;
        let data = match element_type.role() {
            ElementRole::Argb | ElementRole::RetinaArgb => {
                let mut data = Vec::with_capacity(num_pixels * 4);
                for pixel in bitmap.pixels() {
                    match format {
                        PixelFormat::RGBA => {
                            data.extend_from_slice(&[pixel[3],
                                                     pixel[0],
                                                     pixel[1],
                                                     pixel[2]])
                        }
                        PixelFormat::RGB => {
                            data.push(u8::MAX);
                            data.extend_from_slice(pixel);
                        }
                        PixelFormat::Gray => {
                            data.extend_from_slice(&[u8::MAX,
                                                     pixel[0],
                                                     pixel[0],
                                                     pixel[0]])
                        }
                    }
                }
                data
            }
            ElementRole::Rgb => {
                let mut data = Vec::with_capacity(num_pixels * 3);
                for pixel in bitmap.pixels() {
                    match format {
                        PixelFormat::RGBA | PixelFormat::RGB => {
                            data.extend_from_slice(&pixel[..3])
                        }
                        PixelFormat::Gray => {
                            data.extend_from_slice(&[pixel[0],
                                                     pixel[0],
                                                     pixel[0]])
                        }
                    }
                }
                data
            }
            ElementRole::Mask8 => mask_samples(ostype, bitmap, format)?,
            ElementRole::Mask1 => {
                let samples = mask_samples(ostype, bitmap, format)?;
                pack_mask1(&samples, size)
            }
        };
        Ok(IconElement::new(ostype, data))
    }

    /// Decodes this element on its own.  ARGB and legacy color elements
    /// decode to RGBA bitmaps (legacy color data is fully opaque); masks
    /// decode to gray bitmaps.  Returns an error if this element's OSType is
    /// not one this library supports, or if the data is malformed.
    pub fn decode(&self) -> Result<Bitmap> {
        let element_type = self.supported_type()?;
        let size = element_type.pixel_size();
        match element_type.role() {
            ElementRole::Argb | ElementRole::RetinaArgb => {
                self.decode_argb(size)
            }
            ElementRole::Rgb => {
                let rgb = self.decode_rgb(size)?;
                rgb_with_alpha(&rgb, None, size)
            }
            ElementRole::Mask8 => {
                let mask = self.decode_mask8(size)?;
                Bitmap::from_data(PixelFormat::Gray, size, size, mask)
            }
            ElementRole::Mask1 => {
                let mask = self.decode_mask1(size)?;
                Bitmap::from_data(PixelFormat::Gray, size, size, mask)
            }
        }
    }

    /// Decodes this legacy color element together with its mask siblings
    /// into an RGBA bitmap.  The 8-bit mask wins over the 1-bit mask; with
    /// neither, the result is fully opaque.  Non-color elements ignore the
    /// masks and decode as in [`decode`](#method.decode).
    pub fn decode_with_masks(&self,
                             mask8: Option<&IconElement>,
                             mask1: Option<&IconElement>)
                             -> Result<Bitmap> {
        let element_type = self.supported_type()?;
        if element_type.role() != ElementRole::Rgb {
            return self.decode();
        }
        let size = element_type.pixel_size();
        let rgb = self.decode_rgb(size)?;
        let alpha = match (mask8, mask1) {
            (Some(mask), _) => Some(mask.decode_mask8(size)?),
            (None, Some(mask)) => Some(mask.decode_mask1(size)?),
            (None, None) => None,
        };
        rgb_with_alpha(&rgb, alpha.as_ref().map(|a| a.as_slice()), size)
    }

    /// Returns the OSType for this element (e.g. `ic08` or `t8mk`).
    pub fn ostype(&self) -> OSType {
        self.ostype
    }

    /// Returns the registry type of this element, or `None` if the OSType
    /// is not in the registry.
    pub fn element_type(&self) -> Option<ElementType> {
        ElementType::from_ostype(self.ostype).ok()
    }

    /// Returns the encoded data for this element.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the encoded length of the element, in bytes, including the
    /// length of the header.
    pub fn total_length(&self) -> u32 {
        ICON_ELEMENT_HEADER_LENGTH + (self.data.len() as u32)
    }

    /// Reads an icon element from within a serialized icon family.
    /// `remaining` is the number of bytes left in the family; an element
    /// that claims to extend past it is rejected before any payload is
    /// allocated.
    pub fn read<R: Read>(mut reader: R, remaining: u32) -> Result<IconElement> {
        let mut raw_ostype = [0u8; 4];
        reader.read_exact(&mut raw_ostype)?;
        let ostype = OSType(raw_ostype);
        let element_length = reader.read_u32::<BigEndian>()?;
        if element_length < ICON_ELEMENT_HEADER_LENGTH {
            let msg = format!("invalid length {} for '{}' element",
                              element_length,
                              ostype);
            return Err(IconError::corrupt(msg));
        }
        if element_length > remaining {
            let msg = format!("'{}' element length {} exceeds the {} bytes \
                               remaining",
                              ostype,
                              element_length,
                              remaining);
            return Err(IconError::corrupt(msg));
        }
        let data_length = element_length - ICON_ELEMENT_HEADER_LENGTH;
        let mut data = vec![0u8; data_length as usize];
        reader.read_exact(&mut data)?;
        Ok(IconElement::new(ostype, data))
    }

    /// Writes the icon element to within a serialized icon family.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let OSType(ref raw_ostype) = self.ostype;
        writer.write_all(raw_ostype)?;
        writer.write_u32::<BigEndian>(self.total_length())?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn supported_type(&self) -> Result<ElementType> {
        ElementType::from_ostype(self.ostype)
            .map_err(|_| IconError::UnsupportedElementType(self.ostype))
    }

    fn wrong_length(&self, expected: usize) -> IconError {
        let msg = format!("'{}' payload is {} bytes instead of {}",
                          self.ostype,
                          self.data.len(),
                          expected);
        IconError::corrupt(msg)
    }

    fn decode_argb(&self, size: u32) -> Result<Bitmap> {
        let num_pixels = (size * size) as usize;
        if self.data.len() == num_pixels * 4 {
            let mut rgba = Vec::with_capacity(num_pixels * 4);
            for argb in self.data.chunks(4) {
                rgba.extend_from_slice(&[argb[1], argb[2], argb[3], argb[0]]);
            }
            return Bitmap::from_data(PixelFormat::RGBA, size, size, rgba);
        }
        if let Some(result) = self.decode_embedded_png(size) {
            return result;
        }
        Err(self.wrong_length(num_pixels * 4))
    }

    #[cfg(not(feature = "pngio"))]
    fn decode_embedded_png(&self, _size: u32) -> Option<Result<Bitmap>> {
        None
    }

    #[cfg(feature = "pngio")]
    fn decode_embedded_png(&self, size: u32) -> Option<Result<Bitmap>> {
        if self.data.starts_with(PNG_SIGNATURE) {
            Some(self.decode_png(size))
        } else {
            None
        }
    }

    #[cfg(feature = "pngio")]
    fn decode_png(&self, size: u32) -> Result<Bitmap> {
        let input = std::io::Cursor::new(&self.data);
        let image = Bitmap::read_png_limited(input, Some((size, size)))
            .map_err(|err| {
                IconError::corrupt(format!("'{}' holds an invalid PNG: {}",
                                           self.ostype,
                                           err))
            })?;
        image.to_rgba()
    }

    /// Returns packed RGB samples.
    fn decode_rgb(&self, size: u32) -> Result<Vec<u8>> {
        let num_pixels = (size * size) as usize;
        if self.data.len() == num_pixels * 3 {
            return Ok(self.data.clone());
        }
        if self.data.len() == num_pixels * 4 {
            let mut rgb = Vec::with_capacity(num_pixels * 3);
            for xrgb in self.data.chunks(4) {
                rgb.extend_from_slice(&xrgb[1..]);
            }
            return Ok(rgb);
        }
        // Icon files store legacy color data RLE-compressed; the 128x128
        // variant has four zero bytes in front.
        let mut input: &[u8] = &self.data;
        if self.ostype == OSType(*b"it32") {
            if !input.starts_with(&[0, 0, 0, 0]) {
                let msg = format!("'it32' RLE payload of {} bytes lacks its \
                                   4-byte zero prefix",
                                  self.data.len());
                return Err(IconError::corrupt(msg));
            }
            input = &input[4..];
        }
        let mut rgb = vec![0u8; num_pixels * 3];
        decode_rle_rgb(input, &mut rgb).map_err(|_| {
            let msg = format!("'{}' payload of {} bytes is neither raw nor \
                               valid RLE color data",
                              self.ostype,
                              self.data.len());
            IconError::corrupt(msg)
        })?;
        Ok(rgb)
    }

    fn decode_mask8(&self, size: u32) -> Result<Vec<u8>> {
        let num_pixels = (size * size) as usize;
        if self.data.len() != num_pixels {
            return Err(self.wrong_length(num_pixels));
        }
        Ok(self.data.clone())
    }

    /// Expands a 1-bit mask into 0/255 samples.  The payload may be the mask
    /// alone or the classic icon-then-mask pair.
    fn decode_mask1(&self, size: u32) -> Result<Vec<u8>> {
        let row_bytes = mask1_row_bytes(size);
        let mask_length = row_bytes * size as usize;
        let mask = if self.data.len() == mask_length {
            &self.data[..]
        } else if self.data.len() == 2 * mask_length {
            &self.data[mask_length..]
        } else {
            return Err(self.wrong_length(mask_length));
        };
        let mut alpha = Vec::with_capacity((size * size) as usize);
        for row in mask.chunks(row_bytes) {
            for x in 0..size as usize {
                let bit = row[x / 8] & (0x80 >> (x % 8));
                alpha.push(if bit != 0 { u8::MAX } else { 0 });
            }
        }
        Ok(alpha)
    }
}

/// Collects one mask sample per pixel from the bitmap's alpha channel, or
/// from its gray channel if it has only one.
fn mask_samples(ostype: OSType,
                bitmap: &Bitmap,
                format: PixelFormat)
                -> Result<Vec<u8>> {
    match format {
        PixelFormat::RGBA => Ok(bitmap.pixels().map(|pixel| pixel[3]).collect()),
        PixelFormat::Gray => Ok(bitmap.pixels().map(|pixel| pixel[0]).collect()),
        PixelFormat::RGB => Err(IconError::MissingAlphaChannel(ostype)),
    }
}

fn mask1_row_bytes(size: u32) -> usize {
    (size as usize + 7) / 8
}

/// Packs mask samples eight pixels per byte, most significant bit first,
/// with each row padded to a byte boundary.
fn pack_mask1(samples: &[u8], size: u32) -> Vec<u8> {
    let row_bytes = mask1_row_bytes(size);
    let mut packed = vec![0u8; row_bytes * size as usize];
    for (row, out) in samples.chunks(size as usize).zip(packed.chunks_mut(row_bytes)) {
        for (x, &sample) in row.iter().enumerate() {
            if sample >= MASK1_THRESHOLD {
                out[x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    packed
}

fn rgb_with_alpha(rgb: &[u8], alpha: Option<&[u8]>, size: u32) -> Result<Bitmap> {
    let num_pixels = (size * size) as usize;
    let mut rgba = Vec::with_capacity(num_pixels * 4);
    for (index, pixel) in rgb.chunks(3).enumerate() {
        rgba.extend_from_slice(pixel);
        rgba.push(alpha.map_or(u8::MAX, |alpha| alpha[index]));
    }
    Bitmap::from_data(PixelFormat::RGBA, size, size, rgba)
}

/// Decodes the channel-by-channel RLE scheme used for legacy color data.
fn decode_rle_rgb(input: &[u8], output: &mut [u8]) -> std::result::Result<(), ()> {
    debug_assert_eq!(output.len() % 3, 0);
    let num_pixels = output.len() / 3;
    let mut iter = input.iter();
    let mut remaining: usize = 0;
    let mut within_run = false;
    let mut run_value: u8 = 0;
    for channel in 0..3 {
        for pixel in 0..num_pixels {
            if remaining == 0 {
                let next: u8 = *iter.next().ok_or(())?;
                if next < 128 {
                    remaining = (next as usize) + 1;
                    within_run = false;
                } else {
                    remaining = (next as usize) - 125;
                    within_run = true;
                    run_value = *iter.next().ok_or(())?;
                }
            }
            output[3 * pixel + channel] = if within_run {
                run_value
            } else {
                *iter.next().ok_or(())?
            };
            remaining -= 1;
        }
        if remaining != 0 {
            return Err(());
        }
    }
    if iter.next().is_some() { Err(()) } else { Ok(()) }
}
