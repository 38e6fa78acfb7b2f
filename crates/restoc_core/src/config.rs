//! Per-call overrides.

/// Host and database overrides applied to a structure for one use.
///
/// Built explicitly by the caller and handed to
/// [`crate::Table::with_custom`]. The database name becomes
/// `{prefix}{db}{append}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Custom {
    /// Host to run statements on instead of the structure's.
    pub host: Option<String>,
    /// Suffix appended to the database name, for dynamic databases.
    pub append: Option<String>,
    /// Prefix prepended to the database name, for test/dev isolation.
    pub prefix: Option<String>,
}

impl Custom {
    /// Creates an empty override.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the database suffix.
    #[must_use]
    pub fn append(mut self, append: impl Into<String>) -> Self {
        self.append = Some(append.into());
        self
    }

    /// Sets the database prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns true if nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.append.is_none() && self.prefix.is_none()
    }

    /// Applies the prefix and suffix to a database name.
    pub fn db_name(&self, db: &str) -> String {
        format!(
            "{}{}{}",
            self.prefix.as_deref().unwrap_or(""),
            db,
            self.append.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_name() {
        assert_eq!(Custom::new().db_name("app"), "app");
        assert_eq!(
            Custom::new().prefix("test_").append("_42").db_name("app"),
            "test_app_42"
        );
    }

    #[test]
    fn builder() {
        let custom = Custom::new().host("replica");
        assert_eq!(custom.host.as_deref(), Some("replica"));
        assert!(!custom.is_empty());
        assert!(Custom::default().is_empty());
    }
}
