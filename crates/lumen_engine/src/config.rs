//! Engine configuration

use std::time::Duration;

/// Execution environment for the engine
///
/// Controls diagnostics that are too expensive for shipping builds.
/// In `Production`, GPU error polling after state changes and frames
/// is skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Development mode: GPU diagnostics enabled, fail fast on misuse
    Development,
    /// Production mode: GPU diagnostics skipped for performance
    Production,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Execution environment (drives diagnostic checking)
    pub environment: Environment,

    /// Interval between simulation update ticks
    pub update_interval: Duration,

    /// Interval between render ticks
    pub render_interval: Duration,

    /// Default framebuffer clear color (RGBA)
    pub clear_color: [f32; 4],

    /// Default depth buffer clear value
    pub clear_depth: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: if cfg!(debug_assertions) {
                Environment::Development
            } else {
                Environment::Production
            },
            update_interval: Duration::from_millis(33),
            render_interval: Duration::from_millis(16),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_clears_to_opaque_black() {
        let config = EngineConfig::default();
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(config.clear_depth, 1.0);
    }

    #[test]
    fn test_update_runs_slower_than_render_by_default() {
        let config = EngineConfig::default();
        assert!(config.update_interval >= config.render_interval);
    }
}
