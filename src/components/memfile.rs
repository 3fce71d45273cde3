use std::path::{Path, PathBuf};

use gdal::vsi::{create_mem_file, get_vsi_mem_file_bytes_owned, unlink_mem_file};
use log::debug;
use uuid::Uuid;

use crate::errors::Result;

/// Namespace for the in-memory files of one crop call.
///
/// Every call gets its own `/vsimem/` prefix, so concurrent calls never
/// share an intermediate file.
#[derive(Debug)]
pub struct CallScope {
    id: Uuid,
    prefix: PathBuf,
}

impl Default for CallScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CallScope {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        let prefix = PathBuf::from(format!("/vsimem/rastercrop-{id}"));
        Self { id, prefix }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.prefix.join(name)
    }

    /// Reserves `name` for a file GDAL will create.
    pub fn mem_file(&self, name: &str) -> MemFile {
        MemFile {
            path: self.path(name),
            linked: true,
        }
    }

    pub fn create_mem_file(&self, name: &str, data: Vec<u8>) -> Result<MemFile> {
        let mem_file = self.mem_file(name);
        create_mem_file(mem_file.path(), data)?;
        Ok(mem_file)
    }
}

/// In-memory file unlinked on drop.
#[derive(Debug)]
pub struct MemFile {
    path: PathBuf,
    linked: bool,
}

impl MemFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the file content, removing the file.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let bytes = get_vsi_mem_file_bytes_owned(&self.path)?;
        self.linked = false;
        Ok(bytes)
    }
}

impl Drop for MemFile {
    fn drop(&mut self) {
        if self.linked {
            if let Err(err) = unlink_mem_file(&self.path) {
                debug!("{} was not unlinked: {err}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn scopes_do_not_share_paths() {
        let (first, second) = (CallScope::new(), CallScope::new());
        assert_ne!(first.id(), second.id());
        assert_ne!(first.path("output.tif"), second.path("output.tif"));
        assert!(first
            .path("output.tif")
            .starts_with(format!("/vsimem/rastercrop-{}", first.id())));
    }

    #[rstest]
    fn into_bytes_returns_content_and_unlinks() {
        let scope = CallScope::new();
        let mem_file = scope.create_mem_file("data.bin", vec![1, 2, 3]).unwrap();
        let path = mem_file.path().to_path_buf();
        assert_eq!(mem_file.into_bytes().unwrap(), vec![1, 2, 3]);
        assert!(get_vsi_mem_file_bytes_owned(&path).is_err());
    }

    #[rstest]
    fn drop_unlinks() {
        let scope = CallScope::new();
        let path = {
            let mem_file = scope.create_mem_file("data.bin", vec![4, 5]).unwrap();
            mem_file.path().to_path_buf()
        };
        assert!(get_vsi_mem_file_bytes_owned(&path).is_err());
    }
}
