//! Shared fixtures for configuration integration tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A complete, valid document exercising every section.
pub const BASE_DOC: &str = r#"global:
  default_server: proxysql-eu
  read_only: false
  hide_tables:
    - stats_mysql_query_digest_reset
servers:
  proxysql-eu:
    dsn:
      host: proxysql-eu.internal
      port: "6032"
      user: admin
      passwd: admin
      db: main
  proxysql-us:
    dsn:
      host: proxysql-us.internal
      port: 6032
      user: admin
      passwd: admin
      db: main
    read_only: true
    hide_tables:
      - runtime_checksums_values
misc:
  query_rules:
    - title: Top query rules
      info: Hit counts per rule.
      sql: SELECT * FROM stats_mysql_query_rules ORDER BY hits DESC
  adhoc_report:
    - title: Connection pool
      info: ""
      sql: SELECT * FROM stats_mysql_connection_pool
web:
  secret_key: dev-secret
  templates_auto_reload: true
"#;

/// Write `text` as a config file inside a fresh temp directory.
///
/// Returns the directory guard (dropping it removes the file) and the path.
pub fn write_config(text: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, text).unwrap();
    (dir, path)
}
