use anyhow::{Context, Result};
use api::{FaceFrame, LandmarkProvider, ProviderLogger};
use libloading::{Library, Symbol};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Symbol every native provider exports.
const CREATE_SYMBOL: &[u8] = b"create_provider";

/// A provider living in a dynamically loaded library.
///
/// Field order matters: the provider must drop before its library unloads.
pub struct NativeProvider {
    provider: Box<dyn LandmarkProvider>,
    _library: Library,
}

impl NativeProvider {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading provider: {:?}", path);
        unsafe {
            let library = Library::new(path)
                .with_context(|| format!("Failed to load provider library {:?}", path))?;
            let create: Symbol<unsafe extern "C" fn() -> *mut dyn LandmarkProvider> = library
                .get(CREATE_SYMBOL)
                .context("Provider does not export create_provider")?;
            let raw = create();
            if raw.is_null() {
                anyhow::bail!("create_provider returned null");
            }
            let provider = Box::from_raw(raw);
            Ok(Self {
                provider,
                _library: library,
            })
        }
    }
}

impl LandmarkProvider for NativeProvider {
    fn initialize(&mut self, logger: ProviderLogger) -> Result<()> {
        self.provider.initialize(logger)
    }

    fn next_frame(&mut self) -> Result<Option<FaceFrame>> {
        self.provider.next_frame()
    }

    fn unload(&mut self) {
        self.provider.unload();
    }
}

fn plugins_dir() -> PathBuf {
    let native_plugins_dir = Path::new("plugins/native");
    if !native_plugins_dir.exists() {
        let parent_native = Path::new("../plugins/native");
        if parent_native.exists() {
            return parent_native.to_path_buf();
        }
    }
    native_plugins_dir.to_path_buf()
}

fn is_library(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "dll" || ext == "so" || ext == "dylib")
}

/// Loads the library named `active` from the native plugins directory.
pub fn load_active(active: &str) -> Result<NativeProvider> {
    let dir = plugins_dir();
    if !dir.exists() {
        warn!("'plugins/native' directory not found. Creating it.");
        fs::create_dir_all(&dir)?;
    }

    let mut available = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if !is_library(&path) {
            continue;
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        if filename == active {
            return NativeProvider::load(&path);
        }
        available.push(filename);
    }

    anyhow::bail!(
        "Active provider '{}' not found in {:?} (available: {:?})",
        active,
        dir,
        available
    )
}
