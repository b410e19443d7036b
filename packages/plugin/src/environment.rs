//! Process-wide loading strategy detection.

use std::fmt;
use std::sync::OnceLock;

/// Which representation the process loads plugin binaries as.
///
/// Detected once per process and stable afterwards: the same environment
/// always selects the same strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Component-model binaries.
    Component,
    /// Core wasm modules, loaded by image identity.
    Core,
}

impl Environment {
    /// The strategy for this process.
    ///
    /// Honors `FORMFS_MODULE_RUNTIME` (`component` / `core`) on first call;
    /// defaults to [`Environment::Component`]. Later changes to the variable
    /// have no effect.
    pub fn current() -> Environment {
        static DETECTED: OnceLock<Environment> = OnceLock::new();
        *DETECTED.get_or_init(Self::detect)
    }

    fn detect() -> Environment {
        match std::env::var("FORMFS_MODULE_RUNTIME") {
            Ok(value) if value.eq_ignore_ascii_case("core") => Environment::Core,
            Ok(value) if value.eq_ignore_ascii_case("component") => Environment::Component,
            Ok(value) => {
                tracing::warn!(%value, "unrecognized FORMFS_MODULE_RUNTIME, using component");
                Environment::Component
            }
            Err(_) => Environment::Component,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Component => write!(f, "component"),
            Environment::Core => write!(f, "core"),
        }
    }
}
