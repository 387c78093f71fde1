//! Handing a serialized icon family to whatever stores custom icons in
//! filesystem metadata.

use std::path::Path;
use tracing::debug;

use super::error::{ExternalError, IconError, Result};
use super::family::IconFamily;

/// The kind of filesystem entry a custom icon is attached to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory (folder).
    Directory,
}

/// Stores and removes custom icons in a filesystem entry's metadata, and
/// sets or clears the flag that makes the file browser display them.
pub trait MetadataWriter {
    /// Attaches the serialized icon family `icns` to `path`.
    fn set_custom_icon(&self,
                       path: &Path,
                       icns: &[u8],
                       kind: EntryKind)
                       -> std::result::Result<(), ExternalError>;

    /// Removes any custom icon from `path`.
    fn remove_custom_icon(&self,
                          path: &Path,
                          kind: EntryKind)
                          -> std::result::Result<(), ExternalError>;
}

impl IconFamily {
    /// Serializes the family and attaches it to `path` as its custom icon.
    /// Writer failures are reported as [`IconError::Attach`].
    pub fn set_as_custom_icon<W: MetadataWriter + ?Sized>(&self,
                                                          path: &Path,
                                                          writer: &W,
                                                          kind: EntryKind)
                                                          -> Result<()> {
        let icns = self.to_bytes();
        debug!(path = %path.display(), ?kind, bytes = icns.len(),
               "attaching custom icon");
        writer.set_custom_icon(path, &icns, kind).map_err(IconError::Attach)
    }

    /// Removes the custom icon (if any) from `path`.
    pub fn remove_custom_icon<W: MetadataWriter + ?Sized>(path: &Path,
                                                          writer: &W,
                                                          kind: EntryKind)
                                                          -> Result<()> {
        debug!(path = %path.display(), ?kind, "removing custom icon");
        writer.remove_custom_icon(path, kind).map_err(IconError::Attach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::icontype::OSType;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemoryWriter {
        icons: RefCell<HashMap<PathBuf, (Vec<u8>, EntryKind)>>,
    }

    impl MetadataWriter for MemoryWriter {
        fn set_custom_icon(&self,
                           path: &Path,
                           icns: &[u8],
                           kind: EntryKind)
                           -> std::result::Result<(), ExternalError> {
            self.icons.borrow_mut().insert(path.to_path_buf(), (icns.to_vec(), kind));
            Ok(())
        }

        fn remove_custom_icon(&self,
                              path: &Path,
                              _kind: EntryKind)
                              -> std::result::Result<(), ExternalError> {
            match self.icons.borrow_mut().remove(path) {
                Some(_) => Ok(()),
                None => Err(format!("{} has no custom icon", path.display()).into()),
            }
        }
    }

    #[test]
    fn attach_and_remove() {
        let mut family = IconFamily::new();
        family.set_element_data(OSType(*b"quux"), b"foobar".to_vec());
        let writer = MemoryWriter::default();
        let path = Path::new("/tmp/some folder");
        family.set_as_custom_icon(path, &writer, EntryKind::Directory).unwrap();
        {
            let icons = writer.icons.borrow();
            let (icns, kind) = &icons[path];
            assert_eq!(icns, &family.to_bytes());
            assert_eq!(*kind, EntryKind::Directory);
        }
        IconFamily::remove_custom_icon(path, &writer, EntryKind::Directory).unwrap();
        match IconFamily::remove_custom_icon(path, &writer, EntryKind::Directory) {
            Err(err @ IconError::Attach(_)) => assert!(err.is_external()),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
