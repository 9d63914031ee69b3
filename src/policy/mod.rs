//! Policy resolution consumed by the web layer.
//!
//! # Responsibilities
//! - Resolve the effective read-only flag for a server
//! - Merge global and per-server hide lists into one set
//! - Resolve DSNs and ad-hoc query categories by name
//!
//! # Design Decisions
//! - An explicit per-server `read_only` always wins, even `false` over a
//!   global `true`
//! - Hide lists merge by set union
//! - Lookup misses are typed errors for the caller to surface, never panics
//! - An empty category is a valid answer, distinct from an unknown one

use std::collections::BTreeSet;
use thiserror::Error;

use crate::config::model::{AdhocQuery, Configuration, ServerDsn, ServerEntry};

/// Category the dashboard report pulls its queries from.
pub const REPORT_CATEGORY: &str = "adhoc_report";

/// A lookup by name found nothing. Always recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown server \"{0}\"")]
    UnknownServer(String),

    #[error("unknown category \"{0}\"")]
    UnknownCategory(String),
}

impl Configuration {
    /// Server names in document order, which is also the menu order.
    pub fn server_names(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn server(&self, name: &str) -> Result<&ServerEntry, LookupError> {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| LookupError::UnknownServer(name.to_string()))
    }

    /// Effective read-only flag: the per-server override if explicitly set,
    /// otherwise the global default.
    pub fn is_read_only(&self, name: &str) -> Result<bool, LookupError> {
        let server = self.server(name)?;
        Ok(server.read_only.unwrap_or(self.global.read_only))
    }

    /// Effective hidden-table set: union of the global list and the server's
    /// own. Empty when neither is configured.
    pub fn hidden_tables(&self, name: &str) -> Result<BTreeSet<String>, LookupError> {
        let server = self.server(name)?;
        let mut tables = self.global.hidden_tables.clone();
        if let Some(own) = &server.hidden_tables {
            tables.extend(own.iter().cloned());
        }
        Ok(tables)
    }

    pub fn resolve_dsn(&self, name: &str) -> Result<&ServerDsn, LookupError> {
        Ok(&self.server(name)?.dsn)
    }

    /// Queries of one category, in document order.
    pub fn adhoc_queries(&self, category: &str) -> Result<&[AdhocQuery], LookupError> {
        self.categories
            .get(category)
            .map(|c| c.queries.as_slice())
            .ok_or_else(|| LookupError::UnknownCategory(category.to_string()))
    }

    /// Queries behind the dashboard report. The category is optional; an
    /// absent one means an empty report, not an error.
    pub fn report_queries(&self) -> &[AdhocQuery] {
        self.categories
            .get(REPORT_CATEGORY)
            .map(|c| c.queries.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader;

    fn build(text: &str) -> Configuration {
        loader::load_str(text).unwrap()
    }

    const DOC: &str = r#"
global:
  default_server: p1
  read_only: false
  hide_tables: [stats_history]
servers:
  p1:
    dsn:
      host: h1
      port: "3306"
      user: u
      passwd: x
      db: main
  p2:
    dsn:
      host: h2
      port: 6032
      user: u
      passwd: x
      db: main
    read_only: true
    hide_tables: [runtime_checksums, stats_history]
misc:
  empty_category: []
  tuning:
    - title: Slow queries
      info: ""
      sql: SELECT 1
web:
  secret_key: s
"#;

    #[test]
    fn test_server_names_keep_document_order() {
        let config = build(DOC);
        assert_eq!(config.server_names(), ["p1", "p2"]);
    }

    #[test]
    fn test_read_only_falls_back_to_global() {
        let config = build(DOC);
        assert_eq!(config.is_read_only("p1"), Ok(false));
        assert_eq!(config.is_read_only("p2"), Ok(true));
    }

    #[test]
    fn test_explicit_override_wins_over_global_true() {
        let doc = DOC
            .replace("read_only: false", "read_only: true")
            .replace("    read_only: true\n", "    read_only: false\n");
        let config = build(&doc);
        assert_eq!(config.is_read_only("p1"), Ok(true));
        assert_eq!(config.is_read_only("p2"), Ok(false));
    }

    #[test]
    fn test_override_true_while_global_false() {
        let config = build(DOC);
        assert!(!config.global.read_only);
        assert_eq!(config.is_read_only("p2"), Ok(true));
    }

    #[test]
    fn test_hidden_tables_union_without_duplicates() {
        let config = build(DOC);
        let tables = config.hidden_tables("p2").unwrap();
        assert_eq!(
            tables.iter().collect::<Vec<_>>(),
            ["runtime_checksums", "stats_history"]
        );
    }

    #[test]
    fn test_hidden_tables_global_only() {
        let config = build(DOC);
        let tables = config.hidden_tables("p1").unwrap();
        assert_eq!(tables.iter().collect::<Vec<_>>(), ["stats_history"]);
    }

    #[test]
    fn test_hidden_tables_empty_when_nothing_configured() {
        let doc = DOC.replace("  hide_tables: [stats_history]\n", "");
        let config = build(&doc);
        assert!(config.hidden_tables("p1").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_server_is_typed() {
        let config = build(DOC);
        assert_eq!(
            config.is_read_only("p9"),
            Err(LookupError::UnknownServer("p9".to_string()))
        );
        assert!(config.resolve_dsn("p9").is_err());
        assert!(config.hidden_tables("p9").is_err());
    }

    #[test]
    fn test_resolve_dsn_returns_coerced_port() {
        let config = build(DOC);
        assert_eq!(config.resolve_dsn("p1").unwrap().port, 3306);
        assert_eq!(config.resolve_dsn("p1").unwrap().host, "h1");
    }

    #[test]
    fn test_empty_category_distinct_from_unknown() {
        let config = build(DOC);
        assert_eq!(config.adhoc_queries("empty_category"), Ok(&[][..]));
        assert_eq!(
            config.adhoc_queries("nope"),
            Err(LookupError::UnknownCategory("nope".to_string()))
        );
    }

    #[test]
    fn test_report_queries_empty_when_category_absent() {
        let config = build(DOC);
        assert!(config.report_queries().is_empty());

        let doc = DOC.replace(
            "  tuning:\n",
            "  adhoc_report:\n    - title: Pool\n      info: \"\"\n      sql: SELECT 2\n  tuning:\n",
        );
        let config = build(&doc);
        assert_eq!(config.report_queries().len(), 1);
        assert_eq!(config.report_queries()[0].title, "Pool");
    }
}
