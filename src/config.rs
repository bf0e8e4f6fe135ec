//! Process-wide configuration.
//!
//! The configuration is installed at most once and is read-only afterwards.
//! When nothing is installed, the first read falls back to
//! [`Config::from_env`].

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub const SOURCE_ROOTS_ENV: &str = "STRUCTURED_ERROR_SOURCE_ROOTS";
pub const RESOLVE_FN_ENV: &str = "STRUCTURED_ERROR_RESOLVE_FN";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Source of globally unique error identifiers.
pub trait IdProvider: Send + Sync {
    fn new_id(&self) -> String;
}

/// Random v4 UUIDs in their 32-character simple form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[derive(Clone)]
pub struct Config {
    /// Generates the `id` of every new error.
    pub id_provider: Arc<dyn IdProvider>,
    /// Prefixes stripped from captured file paths, tried in order.
    pub source_roots: Vec<String>,
    /// Resolve the enclosing function name from a symbolized backtrace.
    ///
    /// Off by default. Each captured error then forces a full backtrace, and
    /// names are only found when the binary carries debug info. Use
    /// [`here!`](crate::here) or [`structured_error!`](crate::structured_error)
    /// to get the name at compile time instead.
    pub resolve_functions: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            id_provider: Arc::new(UuidProvider),
            source_roots: Vec::new(),
            resolve_functions: false,
        }
    }

    /// Defaults plus source roots and switches taken from the environment:
    /// [`SOURCE_ROOTS_ENV`] (a platform path list), the working directory,
    /// and [`RESOLVE_FN_ENV`] (`1`, `true`, `on` or `yes` turns resolution on).
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Some(paths) = std::env::var_os(SOURCE_ROOTS_ENV) {
            config.source_roots.extend(
                std::env::split_paths(&paths)
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(path_to_root),
            );
        }
        if let Ok(cwd) = std::env::current_dir() {
            config.source_roots.push(path_to_root(cwd));
        }
        if let Ok(flag) = std::env::var(RESOLVE_FN_ENV) {
            config.resolve_functions = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }

        config
    }

    pub fn with_id_provider(mut self, provider: impl IdProvider + 'static) -> Self {
        self.id_provider = Arc::new(provider);
        self
    }

    pub fn with_source_root(mut self, root: impl Into<String>) -> Self {
        self.source_roots.push(root.into());
        self
    }

    pub fn with_resolve_functions(mut self, resolve: bool) -> Self {
        self.resolve_functions = resolve;
        self
    }

    pub fn new_id(&self) -> String {
        self.id_provider.new_id()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source_roots", &self.source_roots)
            .field("resolve_functions", &self.resolve_functions)
            .finish_non_exhaustive()
    }
}

fn path_to_root(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

/// Installs the process-wide configuration.
///
/// Fails, handing the rejected value back, once a configuration is already
/// in place (including the implicit one created by an earlier [`get`]).
pub fn install(config: Config) -> Result<(), Config> {
    match CONFIG.set(config) {
        Ok(()) => {
            tracing::debug!(config = ?get(), "structured error config installed");
            Ok(())
        }
        Err(rejected) => {
            tracing::warn!("structured error config already installed, ignoring");
            Err(rejected)
        }
    }
}

pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl IdProvider for Fixed {
        fn new_id(&self) -> String {
            "fixed".to_string()
        }
    }

    #[test]
    fn uuid_ids_are_unique_and_simple() {
        let a = UuidProvider.new_id();
        let b = UuidProvider.new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn builder_overrides() {
        let config = Config::new()
            .with_id_provider(Fixed)
            .with_source_root("/build/app")
            .with_resolve_functions(true);
        assert_eq!(config.new_id(), "fixed");
        assert_eq!(config.source_roots, vec!["/build/app".to_string()]);
        assert!(config.resolve_functions);
    }

    #[test]
    fn function_resolution_is_opt_in() {
        assert!(!Config::new().resolve_functions);
        assert!(!Config::default().resolve_functions);
    }

    #[test]
    fn debug_hides_provider() {
        let rendered = format!("{:?}", Config::new());
        assert!(rendered.contains("resolve_functions: false"));
        assert!(rendered.contains(".."));
    }
}
