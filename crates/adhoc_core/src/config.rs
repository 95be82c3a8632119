//! Binder configuration

use crate::naming::TEST_PREFIX;

/// How an enhancer names and validates the properties it injects
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindConfig {
    /// Prefix every injected property name with [`BindConfig::prefix`]
    pub test_mode: bool,
    /// Prefix applied in test mode
    pub prefix: String,
    /// Reject blueprint keys that collide with reserved properties
    pub strict_names: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            prefix: TEST_PREFIX.to_string(),
            strict_names: false,
        }
    }
}

impl BindConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable test-mode prefixing
    pub fn test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }

    /// Use a custom test-mode prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Fail on reserved-name collisions instead of warning
    pub fn strict(mut self) -> Self {
        self.strict_names = true;
        self
    }

    /// Prefix in effect for this configuration
    pub fn active_prefix(&self) -> &str {
        if self.test_mode {
            &self.prefix
        } else {
            ""
        }
    }
}
