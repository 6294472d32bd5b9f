//! Proxy synthesis configuration.

/// Configuration of a [`ProxyBuilder`](crate::proxy::ProxyBuilder).
///
/// # Default Configuration
///
/// - Source field named `_source`
/// - Proxy types named `<Source>Proxy_<guid>`
/// - Proxy types cached per source type
/// - Interceptor results checked against the declared return type
///
/// # Example
///
/// ```rust
/// use dynproxy::proxy::ProxyConfig;
///
/// let config = ProxyConfig::default()
///     .with_name_suffix("Audit")
///     .with_strict_returns(false);
/// assert_eq!(config.source_field, "_source");
/// assert!(config.cache_types);
/// ```
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Name of the private field holding the source reference
    pub source_field: String,

    /// Appended to the source type name when naming a proxy type
    pub name_suffix: String,

    /// Reuse the proxy type built for a source type.
    ///
    /// Disabling this synthesizes a new proxy type on every build request.
    pub cache_types: bool,

    /// Reject interceptor results that do not conform to the member's return type.
    ///
    /// When disabled, such results are handed to the caller unchanged.
    pub strict_returns: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            source_field: "_source".to_string(),
            name_suffix: "Proxy".to_string(),
            cache_types: true,
            strict_returns: true,
        }
    }
}

impl ProxyConfig {
    /// Creates the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the source field
    #[must_use]
    pub fn with_source_field(mut self, name: impl Into<String>) -> Self {
        self.source_field = name.into();
        self
    }

    /// Sets the proxy type name suffix
    #[must_use]
    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffix = suffix.into();
        self
    }

    /// Enables or disables proxy type caching
    #[must_use]
    pub fn with_cache_types(mut self, enabled: bool) -> Self {
        self.cache_types = enabled;
        self
    }

    /// Enables or disables return type checking
    #[must_use]
    pub fn with_strict_returns(mut self, enabled: bool) -> Self {
        self.strict_returns = enabled;
        self
    }
}
