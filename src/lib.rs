//! Library for encoding/decoding Mac OS icon families (the `.icns` format),
//! and for building them from arbitrary images.
//!
//! An icon family is a flat list of tagged, length-prefixed elements, each
//! holding one bitmap (or one legacy mask) at a fixed size.  This crate
//! converts bitmaps to and from those elements, reads and writes whole
//! families, and builds families from a source image through a pluggable
//! resampler.  Storing a family as a file's custom icon is delegated to a
//! [`MetadataWriter`].
//!
//! See https://en.wikipedia.org/wiki/Apple_Icon_Image_format for more
//! information about the file format.
//!
//! # Example
//! ```
//! use iconfamily::{Bitmap, IconFamily, OSType, PixelFormat};
//!
//! let mut red = Bitmap::new(PixelFormat::RGBA, 16, 16);
//! for pixel in red.data_mut().chunks_mut(4) {
//!     pixel.copy_from_slice(&[255, 0, 0, 255]);
//! }
//! let mut family = IconFamily::new();
//! family.set_icon_element(OSType(*b"icp4"), &red).unwrap();
//!
//! let bytes = family.to_bytes();
//! let family = IconFamily::parse(&bytes).unwrap();
//! let decoded = family.decode_element(OSType(*b"icp4")).unwrap().unwrap();
//! assert_eq!(decoded.data(), red.data());
//! ```

#![warn(missing_docs)]

mod attach;
mod element;
mod error;
mod family;
mod icontype;
mod image;
#[cfg(feature = "pngio")]
mod pngio;
mod thumbnail;

pub use self::attach::{EntryKind, MetadataWriter};
pub use self::element::IconElement;
pub use self::error::{ExternalError, IconError, Result};
pub use self::family::IconFamily;
pub use self::icontype::{ElementRole, ElementType, IconElementTypeDescriptor,
                         OSType};
pub use self::image::{Bitmap, BitmapLayout, PixelFormat};
#[cfg(feature = "resize")]
pub use self::thumbnail::FastResampler;
pub use self::thumbnail::{Interpolation, Resampler, ThumbnailOptions};
