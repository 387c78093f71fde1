use std::error;
use std::fmt;
use std::io;

use super::icontype::OSType;

/// An error reported by an external collaborator (an image resampler or a
/// filesystem metadata writer).
pub type ExternalError = Box<dyn error::Error + Send + Sync>;

/// Shorthand for results produced by this crate.
pub type Result<T> = std::result::Result<T, IconError>;

/// Errors that can occur while encoding, decoding, or storing an icon
/// family.
#[derive(Debug)]
pub enum IconError {
    /// No registry entry exists for the requested logical size (or the
    /// entry has no retina variant and one was requested).
    UnsupportedSize {
        /// The requested logical size, in pixels.
        size: u32,
        /// Whether the retina variant was requested.
        retina: bool,
    },
    /// The OSType appears in no registry entry.
    UnknownTag(OSType),
    /// The element type cannot be encoded or decoded by this library.
    UnsupportedElementType(OSType),
    /// A mask element was requested from a bitmap that has neither an alpha
    /// channel nor a single gray channel.
    MissingAlphaChannel(OSType),
    /// The container or an element payload is malformed.
    CorruptPayload(String),
    /// The bitmap does not satisfy the preconditions of the element type
    /// (sample depth, planar layout, dimensions).
    InvalidBitmap(String),
    /// Reading or writing the serialized container failed.
    Io(io::Error),
    /// The image resampler failed.
    Resample(ExternalError),
    /// The filesystem metadata writer failed.
    Attach(ExternalError),
}

impl IconError {
    /// Returns true if this error was reported by an external collaborator
    /// (resampler, metadata writer, or the underlying reader/writer) rather
    /// than by the format code itself.
    pub fn is_external(&self) -> bool {
        match self {
            IconError::Io(_) | IconError::Resample(_) | IconError::Attach(_) => true,
            _ => false,
        }
    }

    pub(crate) fn corrupt<S: Into<String>>(msg: S) -> IconError {
        IconError::CorruptPayload(msg.into())
    }

    pub(crate) fn invalid_bitmap<S: Into<String>>(msg: S) -> IconError {
        IconError::InvalidBitmap(msg.into())
    }
}

impl fmt::Display for IconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconError::UnsupportedSize { size, retina: false } => {
                write!(f, "no icon element type has size {}x{}", size, size)
            }
            IconError::UnsupportedSize { size, retina: true } => {
                write!(f,
                       "no retina icon element type has size {}x{}",
                       size,
                       size)
            }
            IconError::UnknownTag(ostype) => {
                write!(f, "unknown icon element type '{}'", ostype)
            }
            IconError::UnsupportedElementType(ostype) => {
                write!(f, "unsupported icon element type '{}'", ostype)
            }
            IconError::MissingAlphaChannel(ostype) => {
                write!(f,
                       "cannot derive '{}' mask from a bitmap without alpha \
                        or gray channel",
                       ostype)
            }
            IconError::CorruptPayload(msg) => {
                write!(f, "corrupt icon data: {}", msg)
            }
            IconError::InvalidBitmap(msg) => write!(f, "invalid bitmap: {}", msg),
            IconError::Io(err) => write!(f, "i/o error: {}", err),
            IconError::Resample(err) => {
                write!(f, "image resampling failed: {}", err)
            }
            IconError::Attach(err) => {
                write!(f, "failed to attach custom icon: {}", err)
            }
        }
    }
}

impl error::Error for IconError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            IconError::Io(err) => Some(err),
            IconError::Resample(err) | IconError::Attach(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for IconError {
    fn from(err: io::Error) -> IconError {
        IconError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = IconError::UnsupportedSize { size: 17, retina: false };
        assert_eq!(err.to_string(), "no icon element type has size 17x17");
        let err = IconError::UnsupportedSize { size: 128, retina: true };
        assert_eq!(err.to_string(), "no retina icon element type has size 128x128");
        let err = IconError::UnknownTag(OSType(*b"quux"));
        assert_eq!(err.to_string(), "unknown icon element type 'quux'");
    }

    #[test]
    fn external_category() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk full");
        assert!(IconError::from(io_err).is_external());
        assert!(IconError::Resample("boom".into()).is_external());
        assert!(IconError::Attach("denied".into()).is_external());
        assert!(!IconError::corrupt("truncated").is_external());
        assert!(!IconError::MissingAlphaChannel(OSType(*b"s8mk")).is_external());
    }
}
