//! Parser options.

/// Headers whose values are free text in OSGi bundle manifests.
const OSGI_FREE_FORM_HEADERS: &[&str] = &[
    "Manifest-Version",
    "Created-By",
    "Built-By",
    "Build-Jdk",
    "Bundle-Name",
    "Bundle-Description",
    "Bundle-Vendor",
    "Bundle-Copyright",
    "Bundle-DocURL",
    "Bundle-ContactAddress",
    "Bundle-Category",
    "Bundle-UpdateLocation",
    "Implementation-Title",
    "Implementation-Vendor",
    "Implementation-Vendor-Id",
    "Implementation-Version",
    "Specification-Title",
    "Specification-Vendor",
    "Specification-Version",
];

/// Options for manifest parsing.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Headers whose value is kept whole instead of being split into
    /// clauses, attributes and directives (default: none).
    ///
    /// Names are compared case-insensitively.
    pub free_form_headers: Vec<String>,
}

impl ParseOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the free-text headers of OSGi bundle manifests
    /// (`Bundle-Vendor`, `Bundle-DocURL`, `Implementation-Title`, ...).
    pub fn osgi() -> Self {
        Self::new().free_form_headers(OSGI_FREE_FORM_HEADERS.iter().copied())
    }

    /// Treat `name` as a free-form header.
    pub fn free_form_header(mut self, name: impl Into<String>) -> Self {
        self.free_form_headers.push(name.into());
        self
    }

    /// Treat every name in `names` as a free-form header.
    pub fn free_form_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.free_form_headers
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether the header called `name` is free-form.
    pub fn is_free_form(&self, name: &str) -> bool {
        self.free_form_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_free_form_headers() {
        let options = ParseOptions::default();
        assert!(!options.is_free_form("Bundle-Vendor"));
    }

    #[test]
    fn names_compare_case_insensitively() {
        let options = ParseOptions::new().free_form_header("Bundle-Vendor");
        assert!(options.is_free_form("bundle-vendor"));
        assert!(options.is_free_form("BUNDLE-VENDOR"));
        assert!(!options.is_free_form("Bundle-Version"));
    }

    #[test]
    fn osgi_preset() {
        let options = ParseOptions::osgi();
        assert!(options.is_free_form("Bundle-DocURL"));
        assert!(options.is_free_form("Implementation-Title"));
        assert!(!options.is_free_form("Import-Package"));
        assert!(!options.is_free_form("Bundle-SymbolicName"));
    }
}
