//! The dynamic extension loader.
//!
//! Libraries are opened on demand (by the `load_external` opcode or the
//! CLI's `-l` flag) and stay open for the VM's lifetime. Symbol resolution
//! searches loaded libraries in insertion order and returns the first
//! match. Extension entry points receive an opaque handle to the running VM
//! and return an `i32` status, which is currently ignored.

use crate::error::{VmError, VmResult};
use libloading::Library;
use std::ffi::c_void;
use std::path::Path;

/// The native entry-point signature extensions export.
pub type ExtensionFn = unsafe extern "C" fn(vm: *mut c_void) -> i32;

/// Registry of loaded dynamic libraries.
#[derive(Default)]
pub struct ExtensionLoader {
    libraries: Vec<Library>,
}

impl ExtensionLoader {
    /// An empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            libraries: Vec::new(),
        }
    }

    /// Number of loaded libraries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Whether no library has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Open a dynamic library and keep it loaded.
    pub fn load(&mut self, path: &Path) -> VmResult<()> {
        // SAFETY: loading a library runs its initializers; the toolchain
        // treats extension libraries as trusted code by contract.
        let library = unsafe { Library::new(path) }.map_err(|e| VmError::ExtensionLoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.libraries.push(library);
        Ok(())
    }

    /// Resolve a symbol against the loaded libraries in insertion order.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ExtensionFn> {
        let mut symbol = Vec::with_capacity(name.len() + 1);
        symbol.extend_from_slice(name.as_bytes());
        symbol.push(0);

        for library in &self.libraries {
            // SAFETY: the signature is the documented extension ABI; the
            // returned pointer is only called while `self` keeps the
            // library mapped.
            if let Ok(f) = unsafe { library.get::<ExtensionFn>(&symbol) } {
                return Some(*f);
            }
        }
        None
    }
}

impl std::fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionLoader")
            .field("libraries", &self.libraries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_fails_to_load() {
        let mut loader = ExtensionLoader::new();
        let err = loader
            .load(Path::new("/nonexistent/libnyx_demo.so"))
            .unwrap_err();
        assert!(matches!(err, VmError::ExtensionLoadFailed { .. }));
        assert!(loader.is_empty());
    }

    #[test]
    fn test_resolve_on_empty_loader_is_none() {
        let loader = ExtensionLoader::new();
        assert!(loader.resolve("anything").is_none());
    }
}
