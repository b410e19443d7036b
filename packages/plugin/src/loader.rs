//! Strategy-aware module loading.

use std::fmt;
use std::path::{Path, PathBuf};

use wasmtime::component::Component;
use wasmtime::{Config, Engine, Module};

use crate::environment::Environment;
use crate::error::{LoadError, Result};

/// Core wasm image header: magic plus version 1, layer 0.
const CORE_WASM_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

/// Loads candidate module files with the strategy of the active
/// [`Environment`].
///
/// One engine backs every load through the same loader, so handles from one
/// batch remain type-compatible when a discovery component compares or links
/// them later.
pub struct ModuleLoader {
    engine: Engine,
    environment: Environment,
}

impl ModuleLoader {
    /// Create a loader for the process-wide environment.
    pub fn new() -> Result<Self> {
        Self::with_environment(Environment::current())
    }

    /// Create a loader for an explicit environment.
    ///
    /// Embedders normally use [`ModuleLoader::new`]; this constructor exists
    /// for hosts that manage strategy selection themselves.
    pub fn with_environment(environment: Environment) -> Result<Self> {
        let engine = match environment {
            Environment::Component => {
                let mut config = Config::new();
                config.wasm_component_model(true);
                Engine::new(&config).map_err(|e| LoadError::Engine {
                    reason: e.to_string(),
                })?
            }
            Environment::Core => Engine::default(),
        };

        tracing::debug!(%environment, "module loader initialized");
        Ok(Self {
            engine,
            environment,
        })
    }

    /// The strategy this loader uses.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The engine backing this loader's handles.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Load a single candidate, surfacing the failure cause.
    pub fn load_module(&self, path: impl AsRef<Path>) -> Result<LoadedModule> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match self.environment {
            Environment::Component => {
                let component =
                    Component::new(&self.engine, &bytes).map_err(|e| LoadError::Malformed {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                Ok(LoadedModule::Component {
                    path: path.to_path_buf(),
                    component,
                })
            }
            Environment::Core => {
                // Identity check before the engine sees the image: core
                // binaries only, no component layer, no text.
                if bytes.len() < CORE_WASM_HEADER.len() || bytes[..8] != CORE_WASM_HEADER {
                    return Err(LoadError::Malformed {
                        path: path.to_path_buf(),
                        reason: "not a core wasm image".to_string(),
                    });
                }
                let module = Module::new(&self.engine, &bytes).map_err(|e| LoadError::Malformed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                Ok(LoadedModule::Core {
                    path: path.to_path_buf(),
                    module,
                })
            }
        }
    }

    /// Load a batch of candidates, keeping input order.
    ///
    /// Candidates that fail to load are skipped, never fatal to the batch:
    /// malformed images at `debug`, unreadable files at `warn`. The result
    /// contains the successfully loaded subset in input order.
    pub fn load_modules<I, P>(&self, paths: I) -> Vec<LoadedModule>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut loaded = Vec::new();
        for path in paths {
            match self.load_module(path.as_ref()) {
                Ok(module) => loaded.push(module),
                Err(LoadError::Malformed { path, reason }) => {
                    tracing::debug!(path = %path.display(), %reason, "skipping malformed module");
                }
                Err(LoadError::Io { path, source }) => {
                    tracing::warn!(path = %path.display(), error = %source, "skipping unreadable module");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "skipping module candidate");
                }
            }
        }
        loaded
    }
}

/// A successfully loaded module handle.
///
/// The variant matches the loader's strategy. Discovery components inspect
/// the handle (starting from [`export_names`](LoadedModule::export_names))
/// for converter implementations; this crate does not look inside.
pub enum LoadedModule {
    /// A component-model binary.
    Component {
        /// Where the candidate was loaded from.
        path: PathBuf,
        /// The compiled component.
        component: Component,
    },
    /// A core wasm module.
    Core {
        /// Where the candidate was loaded from.
        path: PathBuf,
        /// The compiled module.
        module: Module,
    },
}

impl LoadedModule {
    /// The file this module was loaded from.
    pub fn path(&self) -> &Path {
        match self {
            LoadedModule::Component { path, .. } => path,
            LoadedModule::Core { path, .. } => path,
        }
    }

    /// The strategy that produced this handle.
    pub fn environment(&self) -> Environment {
        match self {
            LoadedModule::Component { .. } => Environment::Component,
            LoadedModule::Core { .. } => Environment::Core,
        }
    }

    /// Names exported by the module, for discovery.
    ///
    /// `engine` must be the engine of the loader that produced the handle.
    pub fn export_names(&self, engine: &Engine) -> Vec<String> {
        match self {
            LoadedModule::Component { component, .. } => component
                .component_type()
                .exports(engine)
                .map(|(name, _)| name.to_string())
                .collect(),
            LoadedModule::Core { module, .. } => {
                module.exports().map(|e| e.name().to_string()).collect()
            }
        }
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("path", &self.path())
            .field("environment", &self.environment())
            .finish()
    }
}
