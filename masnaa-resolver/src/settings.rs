//! Resolution settings.
//!
//! Every name the passes look for lives here so hosts can match their own
//! tagging conventions. Settings deserialize from any serde format, and
//! omitted keys keep their defaults.

use serde::{Deserialize, Serialize};

/// Tunable names and capabilities used by the resolver and the passes.
///
/// # Examples
/// ```
/// use masnaa_resolver::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.factory_tag, "masnaa.factory");
/// assert_eq!(settings.invoke_method, "__invoke");
/// assert!(settings.expression_language);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tag that makes a declaration eligible for factory processing.
    /// Non-empty attribute maps under this tag are directives themselves.
    pub factory_tag: String,

    /// Tag that opts a declaration out of directive processing.
    pub ignore_tag: String,

    /// Tag naming a static method to use as named constructor.
    pub constructor_tag: String,

    /// Method called on a service factory that names no method.
    pub invoke_method: String,

    /// Whether expression factories can be evaluated by the host.
    pub expression_language: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            factory_tag: "masnaa.factory".to_string(),
            ignore_tag: "masnaa.ignore_directives".to_string(),
            constructor_tag: "masnaa.constructor".to_string(),
            invoke_method: "__invoke".to_string(),
            expression_language: true,
        }
    }
}
