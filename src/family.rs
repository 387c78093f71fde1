use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

use super::element::{IconElement, ICON_ELEMENT_HEADER_LENGTH};
use super::error::{IconError, Result};
use super::icontype::{ElementRole, ElementType, OSType};
use super::image::Bitmap;

/// The first four bytes of an icon family:
const ICNS_MAGIC_LITERAL: &[u8; 4] = b"icns";

/// The length of an icon family header, in bytes:
const ICON_FAMILY_HEADER_LENGTH: u32 = 8;

/// A set of icon elements, in the form stored in an `.icns` file or attached
/// to a file as its custom icon.
///
/// Each OSType occurs at most once.  Elements keep their insertion order;
/// replacing an element keeps its original position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IconFamily {
    elements: Vec<IconElement>,
}

impl IconFamily {
    /// Creates a new, empty icon family.
    pub fn new() -> IconFamily {
        IconFamily { elements: Vec::new() }
    }

    /// Returns true if the icon family contains no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the elements of the family, in order.
    pub fn elements(&self) -> &[IconElement] {
        &self.elements
    }

    /// Returns the element with the given OSType, if present.
    pub fn element(&self, ostype: OSType) -> Option<&IconElement> {
        self.elements.iter().find(|el| el.ostype() == ostype)
    }

    /// Inserts an element, replacing any existing element with the same
    /// OSType in place, or appending it otherwise.  Returns the element that
    /// was replaced, if any.
    pub fn set_element(&mut self, element: IconElement) -> Option<IconElement> {
        let ostype = element.ostype();
        match self.elements.iter().position(|el| el.ostype() == ostype) {
            Some(index) => {
                trace!(%ostype, "replacing icon element");
                Some(std::mem::replace(&mut self.elements[index], element))
            }
            None => {
                trace!(%ostype, "appending icon element");
                self.elements.push(element);
                None
            }
        }
    }

    /// Stores a raw payload under the given OSType, with the same
    /// replace-or-append behavior as [`set_element`](#method.set_element).
    pub fn set_element_data(&mut self, ostype: OSType, data: Vec<u8>) {
        self.set_element(IconElement::new(ostype, data));
    }

    /// Removes and returns the element with the given OSType, if present.
    pub fn remove_element(&mut self, ostype: OSType) -> Option<IconElement> {
        let index = self.elements.iter().position(|el| el.ostype() == ostype)?;
        Some(self.elements.remove(index))
    }

    /// Keeps only the elements whose OSType satisfies the predicate.
    pub fn retain<F: FnMut(OSType) -> bool>(&mut self, mut keep: F) {
        self.elements.retain(|el| keep(el.ostype()));
    }

    /// Copies the elements of `other` whose OSType satisfies the predicate
    /// into this family, replacing elements with the same OSType.
    pub fn copy_elements_from<F>(&mut self, other: &IconFamily, mut select: F)
        where F: FnMut(OSType) -> bool
    {
        for element in &other.elements {
            if select(element.ostype()) {
                self.set_element(element.clone());
            }
        }
    }

    /// Encodes the bitmap into an element of the given type and stores it in
    /// the family.  On error the family is left unchanged.
    pub fn set_icon_element(&mut self,
                            ostype: OSType,
                            bitmap: &Bitmap)
                            -> Result<()> {
        let element = IconElement::encode(ostype, bitmap)?;
        self.set_element(element);
        Ok(())
    }

    /// Encodes the bitmap as an ARGB element, choosing the element type from
    /// the bitmap's dimensions.  Returns the OSType that was used.
    pub fn set_icon_element_auto(&mut self, bitmap: &Bitmap) -> Result<OSType> {
        if bitmap.width() != bitmap.height() {
            let msg = format!("bitmap is not square ({}x{})",
                              bitmap.width(),
                              bitmap.height());
            return Err(IconError::invalid_bitmap(msg));
        }
        let ostype = ElementType::for_pixel_size(bitmap.width())?.ostype();
        self.set_icon_element(ostype, bitmap)?;
        Ok(ostype)
    }

    /// Decodes the element with the given OSType.  Legacy color elements are
    /// combined with their mask siblings: the 8-bit mask if present,
    /// otherwise the 1-bit mask, otherwise a fully opaque alpha channel.
    ///
    /// Returns `Ok(None)` if the family has no such element.  Returns an
    /// error if the OSType is not a supported element type, or if the data
    /// is malformed.
    pub fn decode_element(&self, ostype: OSType) -> Result<Option<Bitmap>> {
        let element_type = ElementType::from_ostype(ostype)
            .map_err(|_| IconError::UnsupportedElementType(ostype))?;
        let element = match self.element(ostype) {
            Some(element) => element,
            None => return Ok(None),
        };
        let bitmap = if element_type.role() == ElementRole::Rgb {
            let mask8 = element_type.mask8_sibling().and_then(|t| self.element(t));
            let mask1 = element_type.mask1_sibling().and_then(|t| self.element(t));
            element.decode_with_masks(mask8, mask1)?
        } else {
            element.decode()?
        };
        Ok(Some(bitmap))
    }

    /// Decodes the element with the given OSType as an RGBA bitmap with
    /// alpha.  Only ARGB and legacy color elements are accepted; masks are
    /// reported as unsupported.
    pub fn bitmap_with_alpha(&self, ostype: OSType) -> Result<Option<Bitmap>> {
        let element_type = ElementType::from_ostype(ostype)
            .map_err(|_| IconError::UnsupportedElementType(ostype))?;
        if element_type.is_mask() {
            return Err(IconError::UnsupportedElementType(ostype));
        }
        self.decode_element(ostype)
    }

    /// Returns the OSTypes of all ARGB and legacy color elements in the
    /// family, in order.
    pub fn available_icons(&self) -> Vec<OSType> {
        self.elements
            .iter()
            .filter_map(|el| el.element_type())
            .filter(|element_type| !element_type.is_mask())
            .map(|element_type| element_type.ostype())
            .collect()
    }

    /// Decodes every ARGB and legacy color element in the family, in order.
    /// Stops at the first element that fails to decode.
    pub fn decode_all(&self) -> Result<Vec<(OSType, Bitmap)>> {
        let mut result = Vec::new();
        for ostype in self.available_icons() {
            if let Some(bitmap) = self.decode_element(ostype)? {
                result.push((ostype, bitmap));
            }
        }
        Ok(result)
    }

    /// Parses a complete serialized icon family.  The header's length field
    /// must match the length of `bytes` exactly.
    pub fn parse(bytes: &[u8]) -> Result<IconFamily> {
        if bytes.len() < ICON_FAMILY_HEADER_LENGTH as usize {
            let msg = format!("{} bytes is too short for an icon family header",
                              bytes.len());
            return Err(IconError::corrupt(msg));
        }
        if &bytes[..4] != ICNS_MAGIC_LITERAL {
            return Err(IconError::corrupt("not an icon family (wrong magic \
                                           literal)"));
        }
        let file_length = BigEndian::read_u32(&bytes[4..8]);
        if file_length as usize != bytes.len() {
            let msg = format!("header declares {} bytes but {} were given",
                              file_length,
                              bytes.len());
            return Err(IconError::corrupt(msg));
        }
        let mut reader = &bytes[ICON_FAMILY_HEADER_LENGTH as usize..];
        let mut family = IconFamily::new();
        while !reader.is_empty() {
            let remaining = reader.len() as u32;
            if remaining < ICON_ELEMENT_HEADER_LENGTH {
                let msg = format!("{} trailing bytes cannot hold an element \
                                   header",
                                  remaining);
                return Err(IconError::corrupt(msg));
            }
            let element = IconElement::read(&mut reader, remaining)?;
            if family.element(element.ostype()).is_some() {
                let msg = format!("duplicate '{}' element", element.ostype());
                return Err(IconError::corrupt(msg));
            }
            family.elements.push(element);
        }
        Ok(family)
    }

    /// Reads an icon family from a reader (e.g. an `.icns` file).  The
    /// reader must end exactly where the family does.
    pub fn read<R: Read>(mut reader: R) -> Result<IconFamily> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        IconFamily::parse(&bytes)
    }

    /// Reads an icon family from an `.icns` file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<IconFamily> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading icon family");
        let file = BufReader::new(File::open(path)?);
        IconFamily::read(file)
    }

    /// Writes the icon family to a writer.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(ICNS_MAGIC_LITERAL)?;
        writer.write_u32::<BigEndian>(self.total_length())?;
        for element in &self.elements {
            element.write(writer.by_ref())?;
        }
        Ok(())
    }

    /// Serializes the icon family into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.total_length() as usize);
        match self.write(&mut bytes) {
            Ok(()) => bytes,
            // Writing into a Vec<u8> cannot fail.
            Err(_) => unreachable!(),
        }
    }

    /// Writes the icon family to an `.icns` file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(),
               elements = self.elements.len(),
               "writing icon family");
        let mut file = BufWriter::new(File::create(path)?);
        self.write(&mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Returns the encoded length of the family, in bytes, including the
    /// length of the header.
    pub fn total_length(&self) -> u32 {
        let mut length = ICON_FAMILY_HEADER_LENGTH;
        for element in &self.elements {
            length += element.total_length();
        }
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::image::PixelFormat;

    #[test]
    fn icon_with_type() {
        let mut family = IconFamily::new();
        let ostype = OSType(*b"is32");
        assert!(family.decode_element(ostype).unwrap().is_none());
        let image = Bitmap::new(PixelFormat::Gray, 16, 16);
        family.set_icon_element(ostype, &image).unwrap();
        let decoded = family.decode_element(ostype).unwrap().unwrap();
        assert_eq!(decoded.pixel_format(), Some(PixelFormat::RGBA));
        assert!(decoded.data().chunks(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn write_empty_icon_family() {
        let family = IconFamily::new();
        assert!(family.is_empty());
        assert_eq!(0, family.elements().len());
        let mut output: Vec<u8> = vec![];
        family.write(&mut output).expect("write failed");
        assert_eq!(b"icns\0\0\0\x08", &output as &[u8]);
        assert_eq!(family.to_bytes(), output);
    }

    #[test]
    fn read_icon_family_with_fake_elements() {
        let input: &[u8] = b"icns\0\0\0\x1fquux\0\0\0\x0efoobarbaz!\0\0\0\x09#";
        let family = IconFamily::read(input).expect("read failed");
        assert_eq!(2, family.elements().len());
        assert_eq!(OSType(*b"quux"), family.elements()[0].ostype());
        assert_eq!(6, family.elements()[0].data().len());
        assert_eq!(OSType(*b"baz!"), family.elements()[1].ostype());
        assert_eq!(1, family.elements()[1].data().len());
    }

    #[test]
    fn write_icon_family_with_fake_elements() {
        let mut family = IconFamily::new();
        family.set_element_data(OSType(*b"quux"), b"foobar".to_vec());
        family.set_element_data(OSType(*b"baz!"), b"#".to_vec());
        let mut output: Vec<u8> = vec![];
        family.write(&mut output).expect("write failed");
        assert_eq!(b"icns\0\0\0\x1fquux\0\0\0\x0efoobarbaz!\0\0\0\x09#",
                   &output as &[u8]);
        assert_eq!(family.to_bytes(), output);
    }

    #[test]
    fn set_element_replaces_in_place() {
        let mut family = IconFamily::new();
        family.set_element_data(OSType(*b"aaaa"), vec![1]);
        family.set_element_data(OSType(*b"bbbb"), vec![2]);
        let old = family.set_element(IconElement::new(OSType(*b"aaaa"), vec![3, 4]));
        assert_eq!(old.map(|el| el.data().to_vec()), Some(vec![1]));
        let ostypes: Vec<OSType> = family.elements().iter().map(|el| el.ostype()).collect();
        assert_eq!(ostypes, vec![OSType(*b"aaaa"), OSType(*b"bbbb")]);
        assert_eq!(family.total_length(), 8 + 10 + 9);
    }

    #[test]
    fn failed_encode_leaves_family_unchanged() {
        let mut family = IconFamily::new();
        family.set_element_data(OSType(*b"s8mk"), vec![7; 256]);
        let before = family.clone();
        let rgb = Bitmap::new(PixelFormat::RGB, 16, 16);
        assert!(family.set_icon_element(OSType(*b"s8mk"), &rgb).is_err());
        let wrong_size = Bitmap::new(PixelFormat::RGBA, 32, 32);
        assert!(family.set_icon_element(OSType(*b"s8mk"), &wrong_size).is_err());
        assert_eq!(family, before);
    }

    #[test]
    fn parse_rejects_length_mismatch() {
        for input in [&b"icns\0\0\0\x09"[..],
                      &b"icns\0\0\0\x10quux\0\0\0\x09"[..],
                      &b"icns\0\0\0\x0cquux"[..],
                      &b"icns\0\0\0\x10quux\0\0\0\x04"[..],
                      &b"icnx\0\0\0\x08"[..],
                      &b"icns"[..]]
            .iter() {
            match IconFamily::parse(input) {
                Err(IconError::CorruptPayload(_)) => {}
                other => panic!("unexpected result for {:?}: {:?}", input, other),
            }
        }
    }

    #[test]
    fn parse_rejects_duplicate_elements() {
        let input: &[u8] = b"icns\0\0\0\x1aquux\0\0\0\x09#quux\0\0\0\x09!";
        match IconFamily::parse(input) {
            Err(IconError::CorruptPayload(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn decode_unknown_ostype_fails() {
        let mut family = IconFamily::new();
        family.set_element_data(OSType(*b"quux"), vec![0; 16]);
        match family.decode_element(OSType(*b"quux")) {
            Err(IconError::UnsupportedElementType(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn bitmap_with_alpha_rejects_masks() {
        let family = IconFamily::new();
        assert!(family.bitmap_with_alpha(OSType(*b"t8mk")).is_err());
        assert!(family.bitmap_with_alpha(OSType(*b"it32")).unwrap().is_none());
    }

    #[test]
    fn filter_elements_between_families() {
        let mut source = IconFamily::new();
        source.set_element_data(OSType(*b"ic08"), vec![1]);
        source.set_element_data(OSType(*b"it32"), vec![2]);
        source.set_element_data(OSType(*b"t8mk"), vec![3]);
        let mut target = IconFamily::new();
        target.set_element_data(OSType(*b"it32"), vec![9]);
        target.copy_elements_from(&source, |ostype| ostype != OSType(*b"ic08"));
        assert_eq!(target.element(OSType(*b"it32")).unwrap().data(), &[2]);
        assert_eq!(target.elements().len(), 2);
        target.retain(|ostype| ostype == OSType(*b"t8mk"));
        assert_eq!(target.elements().len(), 1);
        assert!(target.remove_element(OSType(*b"t8mk")).is_some());
        assert!(target.is_empty());
    }

    #[test]
    fn auto_type_from_dimensions() {
        let mut family = IconFamily::new();
        let image = Bitmap::new(PixelFormat::RGBA, 64, 64);
        assert_eq!(family.set_icon_element_auto(&image).unwrap(), OSType(*b"ic12"));
        let odd = Bitmap::new(PixelFormat::RGBA, 48, 48);
        assert!(family.set_icon_element_auto(&odd).is_err());
        assert_eq!(family.available_icons(), vec![OSType(*b"ic12")]);
    }
}
