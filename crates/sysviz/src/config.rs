//! Configuration types for visualization runs.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file by the CLI; every field has a default so an empty config is
//! valid.

use std::time::Duration;

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Kernel session settings.
    #[serde(default)]
    kernel: KernelConfig,

    /// Standalone fallback settings.
    #[serde(default)]
    fallback: FallbackConfig,
}

impl AppConfig {
    pub fn new(kernel: KernelConfig, fallback: FallbackConfig) -> Self {
        Self { kernel, fallback }
    }

    pub fn kernel(&self) -> &KernelConfig {
        &self.kernel
    }

    pub fn fallback(&self) -> &FallbackConfig {
        &self.fallback
    }
}

/// Settings for the kernel session.
#[derive(Debug, Clone, Deserialize)]
pub struct KernelConfig {
    /// Kernelspec name to launch.
    #[serde(default = "default_kernel_name")]
    name: String,

    /// Seconds to wait for the kernel to report ready after launch.
    #[serde(default = "default_startup_timeout")]
    startup_timeout_secs: u64,

    /// Seconds a single execute exchange may take.
    #[serde(default = "default_execute_timeout")]
    execute_timeout_secs: u64,
}

fn default_kernel_name() -> String {
    "sysml".to_string()
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_execute_timeout() -> u64 {
    60
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: default_kernel_name(),
            startup_timeout_secs: default_startup_timeout(),
            execute_timeout_secs: default_execute_timeout(),
        }
    }
}

impl KernelConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }
}

/// Settings for the standalone PlantUML fallback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackConfig {
    /// Override for the `plantuml` executable path.
    #[serde(default)]
    plantuml: Option<String>,
}

impl FallbackConfig {
    /// Build a config with an explicit `plantuml` executable override.
    pub fn new(plantuml: Option<String>) -> Self {
        Self { plantuml }
    }

    /// The PlantUML command to invoke, defaulting to `plantuml` on PATH.
    pub fn plantuml_command(&self) -> &str {
        self.plantuml.as_deref().unwrap_or("plantuml")
    }
}
