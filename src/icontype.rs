use std::fmt;
use std::str::FromStr;

use super::error::{IconError, Result};

/// A Macintosh OSType (also known as a ResType), used in icon families to
/// identify the type of each element.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OSType(pub [u8; 4]);

impl fmt::Display for OSType {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let &OSType(raw) = self;
        for &byte in &raw {
            write!(out, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl FromStr for OSType {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<OSType, String> {
        let bytes = input.as_bytes();
        if bytes.len() != 4 {
            Err(format!("OSType string must be 4 bytes (was {})", bytes.len()))
        } else {
            let mut raw = [0u8; 4];
            raw.clone_from_slice(bytes);
            Ok(OSType(raw))
        }
    }
}

/// One row of the element type registry: every OSType used to store an icon
/// of a given logical size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IconElementTypeDescriptor {
    /// Logical (screen) size of the icon, in pixels.
    pub size: u32,
    /// Non-premultiplied ARGB pixel data at `size` x `size`.
    pub argb: OSType,
    /// Non-premultiplied ARGB pixel data at 2x density, if defined.
    pub retina: Option<OSType>,
    /// Legacy color data without alpha.
    pub rgb: Option<OSType>,
    /// Legacy 8-bit mask.
    pub mask8: Option<OSType>,
    /// Legacy 1-bit mask.
    pub mask1: Option<OSType>,
}

const fn descriptor(size: u32,
                    argb: &[u8; 4],
                    retina: Option<&[u8; 4]>,
                    legacy: Option<(&[u8; 4], &[u8; 4])>,
                    mask1: Option<&[u8; 4]>)
                    -> IconElementTypeDescriptor {
    IconElementTypeDescriptor {
        size: size,
        argb: OSType(*argb),
        retina: match retina {
            Some(raw) => Some(OSType(*raw)),
            None => None,
        },
        rgb: match legacy {
            Some((rgb, _)) => Some(OSType(*rgb)),
            None => None,
        },
        mask8: match legacy {
            Some((_, mask8)) => Some(OSType(*mask8)),
            None => None,
        },
        mask1: match mask1 {
            Some(raw) => Some(OSType(*raw)),
            None => None,
        },
    }
}

// One row per logical size.  Sizes introduced after the legacy mask scheme
// was retired have no legacy tags.
static ICON_ELEMENT_TYPES: [IconElementTypeDescriptor; 7] = [
    descriptor(16, b"icp4", Some(b"ic11"), Some((b"is32", b"s8mk")), Some(b"ics#")),
    descriptor(18, b"icsb", Some(b"icsB"), None, None),
    descriptor(32, b"icp5", Some(b"ic12"), Some((b"il32", b"l8mk")), Some(b"ICN#")),
    descriptor(36, b"icsd", None, None, None),
    descriptor(128, b"ic07", Some(b"ic13"), Some((b"it32", b"t8mk")), None),
    descriptor(256, b"ic08", Some(b"ic14"), None, None),
    descriptor(512, b"ic09", Some(b"ic10"), None, None),
];

impl IconElementTypeDescriptor {
    /// Returns every registry entry, in ascending order of size.
    pub fn all() -> &'static [IconElementTypeDescriptor] {
        &ICON_ELEMENT_TYPES
    }

    /// Finds the registry entry for the given logical size.  If `retina` is
    /// true, the entry must also define a 2x density variant.
    ///
    /// # Examples
    /// ```
    /// use iconfamily::{IconElementTypeDescriptor, OSType};
    /// let entry = IconElementTypeDescriptor::lookup(32, true).unwrap();
    /// assert_eq!(entry.argb, OSType(*b"icp5"));
    /// assert_eq!(entry.retina, Some(OSType(*b"ic12")));
    /// assert!(IconElementTypeDescriptor::lookup(36, true).is_err());
    /// assert!(IconElementTypeDescriptor::lookup(48, false).is_err());
    /// ```
    pub fn lookup(size: u32,
                  retina: bool)
                  -> Result<&'static IconElementTypeDescriptor> {
        ICON_ELEMENT_TYPES.iter()
            .find(|entry| {
                entry.size == size && (!retina || entry.retina.is_some())
            })
            .ok_or(IconError::UnsupportedSize {
                size: size,
                retina: retina,
            })
    }

    /// Returns the OSType this entry uses for the given role, if any.
    pub fn ostype(&self, role: ElementRole) -> Option<OSType> {
        match role {
            ElementRole::Argb => Some(self.argb),
            ElementRole::RetinaArgb => self.retina,
            ElementRole::Rgb => self.rgb,
            ElementRole::Mask8 => self.mask8,
            ElementRole::Mask1 => self.mask1,
        }
    }

    /// Returns true if this size participates in the legacy color/mask
    /// encodings.
    pub fn has_legacy_elements(&self) -> bool {
        self.rgb.is_some()
    }
}

/// The part an element plays within its registry entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ElementRole {
    /// Unified ARGB data at 1x density.
    Argb,
    /// Unified ARGB data at 2x "retina" density.
    RetinaArgb,
    /// Legacy color data; transparency lives in sibling mask elements.
    Rgb,
    /// Legacy 8-bit mask.
    Mask8,
    /// Legacy 1-bit mask.
    Mask1,
}

const ALL_ROLES: [ElementRole; 5] = [ElementRole::Argb,
                                     ElementRole::RetinaArgb,
                                     ElementRole::Rgb,
                                     ElementRole::Mask8,
                                     ElementRole::Mask1];

/// A registry-recognized element type: an entry plus the role one of its
/// OSTypes plays.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ElementType {
    descriptor: &'static IconElementTypeDescriptor,
    role: ElementRole,
}

impl ElementType {
    /// Reverse lookup of an OSType in the registry.
    ///
    /// # Examples
    /// ```
    /// use iconfamily::{ElementRole, ElementType, OSType};
    /// let element_type = ElementType::from_ostype(OSType(*b"t8mk")).unwrap();
    /// assert_eq!(element_type.role(), ElementRole::Mask8);
    /// assert_eq!(element_type.pixel_size(), 128);
    /// assert!(ElementType::from_ostype(OSType(*b"quux")).is_err());
    /// ```
    pub fn from_ostype(ostype: OSType) -> Result<ElementType> {
        for entry in ICON_ELEMENT_TYPES.iter() {
            for &role in ALL_ROLES.iter() {
                if entry.ostype(role) == Some(ostype) {
                    return Ok(ElementType {
                        descriptor: entry,
                        role: role,
                    });
                }
            }
        }
        Err(IconError::UnknownTag(ostype))
    }

    /// Chooses the ARGB element type for an icon of logical size `size`
    /// rendered at `pixels` x `pixels`: `pixels == size` selects the 1x
    /// type, `pixels == 2 * size` the retina type.
    pub fn for_pixels(size: u32, pixels: u32) -> Result<ElementType> {
        let retina = pixels != size;
        if retina && pixels != size.saturating_mul(2) {
            return Err(IconError::UnsupportedSize {
                size: size,
                retina: true,
            });
        }
        let entry = IconElementTypeDescriptor::lookup(size, retina)?;
        Ok(ElementType {
            descriptor: entry,
            role: if retina {
                ElementRole::RetinaArgb
            } else {
                ElementRole::Argb
            },
        })
    }

    /// Chooses an ARGB element type for a square bitmap of `pixels` x
    /// `pixels`, preferring a 1x type over a retina type of half the
    /// logical size.
    ///
    /// # Examples
    /// ```
    /// use iconfamily::{ElementType, OSType};
    /// let ostype = |pixels| ElementType::for_pixel_size(pixels).unwrap().ostype();
    /// assert_eq!(ostype(32), OSType(*b"icp5"));
    /// assert_eq!(ostype(64), OSType(*b"ic12"));
    /// assert_eq!(ostype(1024), OSType(*b"ic10"));
    /// assert!(ElementType::for_pixel_size(100).is_err());
    /// ```
    pub fn for_pixel_size(pixels: u32) -> Result<ElementType> {
        ElementType::for_pixels(pixels, pixels).or_else(|_| {
            if pixels % 2 == 0 {
                ElementType::for_pixels(pixels / 2, pixels)
            } else {
                Err(IconError::UnsupportedSize {
                    size: pixels,
                    retina: false,
                })
            }
        })
    }

    /// Returns the registry entry this type belongs to.
    pub fn descriptor(self) -> &'static IconElementTypeDescriptor {
        self.descriptor
    }

    /// Returns the role this type plays within its entry.
    pub fn role(self) -> ElementRole {
        self.role
    }

    /// Returns the OSType for this element type.
    pub fn ostype(self) -> OSType {
        match self.descriptor.ostype(self.role) {
            Some(ostype) => ostype,
            // Constructors only ever pair an entry with a role it defines.
            None => unreachable!(),
        }
    }

    /// Returns the logical (screen) size of this type, in pixels.
    pub fn screen_size(self) -> u32 {
        self.descriptor.size
    }

    /// Returns 2 for retina types, 1 otherwise.
    pub fn pixel_density(self) -> u32 {
        match self.role {
            ElementRole::RetinaArgb => 2,
            _ => 1,
        }
    }

    /// Returns the width (and height) of the pixel data for this type.
    ///
    /// # Examples
    /// ```
    /// use iconfamily::{ElementType, OSType};
    /// let pixels = |raw: &[u8; 4]| {
    ///     ElementType::from_ostype(OSType(*raw)).unwrap().pixel_size()
    /// };
    /// assert_eq!(pixels(b"is32"), 16);
    /// assert_eq!(pixels(b"ic11"), 32);
    /// assert_eq!(pixels(b"ic10"), 1024);
    /// ```
    pub fn pixel_size(self) -> u32 {
        self.screen_size() * self.pixel_density()
    }

    /// Returns true if this type is one of the legacy masks.
    pub fn is_mask(self) -> bool {
        match self.role {
            ElementRole::Mask8 | ElementRole::Mask1 => true,
            _ => false,
        }
    }

    /// Returns the 8-bit mask type whose alpha completes this legacy color
    /// type, if any.
    pub fn mask8_sibling(self) -> Option<OSType> {
        match self.role {
            ElementRole::Rgb => self.descriptor.mask8,
            _ => None,
        }
    }

    /// Returns the 1-bit mask type whose alpha completes this legacy color
    /// type, if any.
    pub fn mask1_sibling(self) -> Option<OSType> {
        match self.role {
            ElementRole::Rgb => self.descriptor.mask1,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn element_type_ostype_round_trip() {
        for entry in IconElementTypeDescriptor::all() {
            for &role in ALL_ROLES.iter() {
                if let Some(ostype) = entry.ostype(role) {
                    let element_type = ElementType::from_ostype(ostype)
                        .expect("registered ostype not found");
                    assert_eq!(element_type.ostype(), ostype);
                    assert_eq!(element_type.role(), role);
                    assert_eq!(element_type.screen_size(), entry.size);
                }
            }
        }
    }

    #[test]
    fn registry_is_well_formed() {
        let mut sizes = HashSet::new();
        let mut ostypes = HashSet::new();
        for entry in IconElementTypeDescriptor::all() {
            assert!(sizes.insert(entry.size), "duplicate size {}", entry.size);
            for &role in ALL_ROLES.iter() {
                if let Some(ostype) = entry.ostype(role) {
                    assert!(ostypes.insert(ostype), "duplicate ostype {}", ostype);
                }
            }
            // Masks only exist alongside legacy color data.
            if entry.mask8.is_some() || entry.mask1.is_some() {
                assert!(entry.has_legacy_elements());
            }
        }
    }

    #[test]
    fn lookup_unsupported_size() {
        match IconElementTypeDescriptor::lookup(64, false) {
            Err(IconError::UnsupportedSize { size: 64, retina: false }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match IconElementTypeDescriptor::lookup(36, true) {
            Err(IconError::UnsupportedSize { size: 36, retina: true }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn for_pixels_selects_density() {
        let normal = ElementType::for_pixels(256, 256).unwrap();
        assert_eq!(normal.ostype(), OSType(*b"ic08"));
        let retina = ElementType::for_pixels(256, 512).unwrap();
        assert_eq!(retina.ostype(), OSType(*b"ic14"));
        assert_eq!(retina.pixel_density(), 2);
        assert!(ElementType::for_pixels(256, 300).is_err());
    }

    #[test]
    fn pixel_sizes_cover_standard_range() {
        for &pixels in [16, 18, 32, 36, 64, 128, 256, 512, 1024].iter() {
            let element_type = ElementType::for_pixel_size(pixels).unwrap();
            assert_eq!(element_type.pixel_size(), pixels);
        }
        // 36 pixels has both a 1x and a retina type; 1x wins.
        assert_eq!(ElementType::for_pixel_size(36).unwrap().ostype(),
                   OSType(*b"icsd"));
    }

    #[test]
    fn mask_siblings() {
        let rgb = ElementType::from_ostype(OSType(*b"il32")).unwrap();
        assert_eq!(rgb.mask8_sibling(), Some(OSType(*b"l8mk")));
        assert_eq!(rgb.mask1_sibling(), Some(OSType(*b"ICN#")));
        let rgb = ElementType::from_ostype(OSType(*b"it32")).unwrap();
        assert_eq!(rgb.mask8_sibling(), Some(OSType(*b"t8mk")));
        assert_eq!(rgb.mask1_sibling(), None);
        let argb = ElementType::from_ostype(OSType(*b"ic07")).unwrap();
        assert_eq!(argb.mask8_sibling(), None);
        assert!(ElementType::from_ostype(OSType(*b"ics#")).unwrap().is_mask());
    }

    #[test]
    fn ostype_to_and_from_str() {
        let ostype = OSType::from_str("abcd").expect("failed to parse OSType");
        assert_eq!(ostype.to_string(), "abcd".to_string());
    }

    #[test]
    fn ostype_from_str_failure() {
        assert_eq!(OSType::from_str("abc"),
                   Err("OSType string must be 4 bytes (was 3)".to_string()));
        assert_eq!(OSType::from_str("abcde"),
                   Err("OSType string must be 4 bytes (was 5)".to_string()));
    }
}
