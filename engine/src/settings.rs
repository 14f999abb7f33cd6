use serde::Deserialize;

/// Engine configuration. Every field has a default, so an empty config
/// file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base type every generated unit must extend.
    pub base_template: String,
    /// Reading an unbound variable is an error instead of none.
    pub strict_variables: bool,
    /// Maximum nesting of block and macro invocations within one render.
    pub max_render_depth: usize,
    /// Reuse built templates while their source is unchanged.
    pub cache_templates: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_template: "Template".to_string(),
            strict_variables: false,
            max_render_depth: 256,
            cache_templates: true,
        }
    }
}
