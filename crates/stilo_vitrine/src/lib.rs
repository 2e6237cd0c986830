//! Vitrine - The bundler-facing surface for Stilo.
//!
//! The display case: a thin plugin object a bundler host drives. It
//! filters candidate files cheaply (extension, hook substring, vendor
//! directories), hands survivors to the rewrite workshop and wraps the
//! result as modified text plus a source map. Unchanged files yield
//! nothing, so downstream passes keep seeing the original source.

use serde::{Deserialize, Serialize};
use stilo_atelier::{rewrite_source, RewriteError, SourceMap, SourceType};
use stilo_carton::idents;

/// Run-order hint for the bundler host. The capture transform must run
/// before other transforms touch the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforce {
    Pre,
    Post,
}

/// Plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Accepted file extensions (script and script-with-markup kinds).
    pub extensions: Vec<String>,
    /// Path segments of dependency vendor directories to reject.
    pub exclude_dirs: Vec<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            extensions: ["js", "jsx", "mjs", "ts", "tsx"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_dirs: vec![String::from("node_modules")],
        }
    }
}

/// A transformed file: modified text plus its source map.
#[derive(Debug, Serialize)]
pub struct TransformOutput {
    pub code: String,
    pub map: SourceMap,
}

/// The inline-task bundler plugin.
#[derive(Debug, Clone, Default)]
pub struct InlineTaskPlugin {
    options: PluginOptions,
}

impl InlineTaskPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PluginOptions) -> Self {
        Self { options }
    }

    pub fn name(&self) -> &'static str {
        "stilo:inline-task"
    }

    pub fn enforce(&self) -> Enforce {
        Enforce::Pre
    }

    /// Transform one module. Returns `Ok(None)` for every file the plugin
    /// does not touch; parse failures are surfaced to the host.
    pub fn transform(
        &self,
        code: &str,
        id: &str,
    ) -> Result<Option<TransformOutput>, RewriteError> {
        let Some(source_type) = self.accepted_source_type(id) else {
            return Ok(None);
        };
        if !code.contains(idents::HOOK_NAME) {
            return Ok(None);
        }
        if self.is_vendored(id) {
            tracing::debug!(id, "inline-task transform skipped: vendor directory");
            return Ok(None);
        }

        match rewrite_source(code, source_type, id)? {
            Some(output) => {
                tracing::debug!(id, "inline-task calls rewritten");
                Ok(Some(TransformOutput {
                    code: output.code,
                    map: output.map,
                }))
            }
            None => Ok(None),
        }
    }

    /// Map the id's extension to a parse dialect, if accepted. Bundler ids
    /// may carry a query suffix; only the path part is examined.
    fn accepted_source_type(&self, id: &str) -> Option<SourceType> {
        let path = id.split('?').next().unwrap_or(id);
        let ext = path.rsplit('.').next()?;
        if !self.options.extensions.iter().any(|e| e == ext) {
            return None;
        }
        let source_type = match ext {
            "ts" => SourceType::ts(),
            "tsx" => SourceType::tsx(),
            // Plain scripts in this stack may still hold markup
            _ => SourceType::jsx(),
        };
        Some(source_type)
    }

    fn is_vendored(&self, id: &str) -> bool {
        let path = id.split('?').next().unwrap_or(id);
        path.split(|c| c == '/' || c == '\\')
            .any(|segment| self.options.exclude_dirs.iter().any(|d| d == segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENT: &str =
        "function C() { const x = 1; useInlineTask(() => { use(x); }); return <div/>; }";

    #[test]
    fn test_plugin_identity() {
        let plugin = InlineTaskPlugin::new();
        assert_eq!(plugin.name(), "stilo:inline-task");
        assert_eq!(plugin.enforce(), Enforce::Pre);
    }

    #[test]
    fn test_transform_produces_code_and_map() {
        let plugin = InlineTaskPlugin::new();
        let output = plugin
            .transform(COMPONENT, "src/comp.tsx")
            .unwrap()
            .unwrap();
        assert!(output.code.contains("__scope.x"));
        assert_eq!(output.map.version, 3);
        assert_eq!(output.map.sources, ["src/comp.tsx"]);
    }

    #[test]
    fn test_query_suffix_is_ignored_for_filtering() {
        let plugin = InlineTaskPlugin::new();
        let output = plugin.transform(COMPONENT, "src/comp.tsx?v=123").unwrap();
        assert!(output.is_some());
    }

    #[test]
    fn test_unknown_extension_is_skipped() {
        let plugin = InlineTaskPlugin::new();
        assert!(plugin.transform(COMPONENT, "src/comp.vue").unwrap().is_none());
        assert!(plugin.transform(COMPONENT, "styles.css").unwrap().is_none());
    }

    #[test]
    fn test_file_without_hook_substring_is_skipped() {
        let plugin = InlineTaskPlugin::new();
        let result = plugin
            .transform("function C() { return <div/>; }", "src/comp.tsx")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_vendor_directory_is_rejected() {
        let plugin = InlineTaskPlugin::new();
        let result = plugin
            .transform(COMPONENT, "node_modules/pkg/dist/index.tsx")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_substring_without_call_yields_nothing() {
        let plugin = InlineTaskPlugin::new();
        // Mentions the hook but never calls it
        let result = plugin
            .transform("const doc = 'see useInlineTask';", "src/notes.ts")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_failure_is_surfaced() {
        let plugin = InlineTaskPlugin::new();
        let result = plugin.transform("useInlineTask(() => {", "src/broken.tsx");
        assert!(matches!(result, Err(RewriteError::Parse { .. })));
    }

    #[test]
    fn test_options_roundtrip() {
        let options = PluginOptions::default();
        let json = serde_json::to_string(&options).unwrap();
        let back: PluginOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.extensions, options.extensions);
        assert_eq!(back.exclude_dirs, options.exclude_dirs);
    }
}
