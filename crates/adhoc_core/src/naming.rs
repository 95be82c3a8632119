//! Property naming
//!
//! All names an enhancer injects are computed once, when the enhancer is
//! built, from the blueprint key and the [`BindConfig`].

use crate::config::BindConfig;

/// Display name attached to every enhancer and enhanced component
pub const DISPLAY_NAME: &str = "withStreams";

/// Default prefix applied in test mode
pub const TEST_PREFIX: &str = "data-";

/// Unprefixed name of the dispatch property
pub const DISPATCH: &str = "dispatch";

/// Stem prepended to a key to form its setter name
pub const SETTER_STEM: &str = "set";

/// Names injected for one blueprint entry
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropNames {
    /// Property holding the latest emitted value
    pub property_name: String,
    /// Name the state setter is registered under
    pub setter_name: String,
    /// Property holding the dispatch function
    pub dispatch_name: String,
}

impl PropNames {
    pub fn for_key(key: &str, config: &BindConfig) -> Self {
        let prefix = config.active_prefix();
        Self {
            property_name: format!("{prefix}{key}"),
            setter_name: format!("{prefix}{SETTER_STEM}{key}"),
            dispatch_name: dispatch_name(config),
        }
    }
}

/// Name of the dispatch property under `config`
pub fn dispatch_name(config: &BindConfig) -> String {
    format!("{}{DISPATCH}", config.active_prefix())
}

/// First reserved name that `names` shadows, if any
///
/// Reserved names are the dispatch property and every setter of the
/// enhancer, including the entry's own.
pub fn reserved_collision(names: &PropNames, all: &[PropNames]) -> Option<String> {
    if names.property_name == names.dispatch_name {
        return Some(names.dispatch_name.clone());
    }
    all.iter()
        .find(|other| other.setter_name == names.property_name)
        .map(|other| other.setter_name.clone())
}
