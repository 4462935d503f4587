//! Template loader module.
//!
//! Pages are read from `<base_path>/<name>.html` on every render so they
//! can be edited without a restart. Pages missing on disk fall back to the
//! copies compiled into the binary.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Result, TemplateContext, TemplateError};

/// Pages compiled into the binary.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("home", include_str!("../../templates/home.html")),
    ("blank", include_str!("../../templates/blank.html")),
    ("external_link", include_str!("../../templates/external_link.html")),
];

/// Template loader with built-in fallback.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    base_path: PathBuf,
}

impl TemplateLoader {
    /// Create a new template loader over a directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{name}.html"))
    }

    /// Built-in copy of a page, if there is one.
    pub fn builtin(name: &str) -> Option<&'static str> {
        BUILTIN_TEMPLATES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, content)| *content)
    }

    /// Load a page, preferring the file on disk.
    pub fn load(&self, name: &str) -> Result<String> {
        if name.contains("..") || name.starts_with('/') {
            return Err(TemplateError::NotFound(name.to_string()));
        }

        let path = self.template_path(name);
        if path.is_file() {
            return fs::read_to_string(&path).map_err(|e| {
                TemplateError::Render(format!("Failed to read template '{name}': {e}"))
            });
        }

        Self::builtin(name)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::NotFound(format!("Template '{name}' not found at {path:?}")))
    }

    /// Render a page.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let content = self.load(name)?;
        super::render(&content, context)
    }
}
