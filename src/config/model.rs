//! Typed configuration model.
//!
//! Everything here is an immutable value object built exactly once per load.
//! Derived views (sorted categories, hide-table sets, normalized defaults)
//! are computed at construction and never re-derived by readers.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::schema::RawDocument;
pub use crate::config::schema::{VariableKind, VariableValue};

/// Fleet-wide defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSettings {
    /// Server the dashboard lands on. Always names an entry in `servers`.
    pub default_server: String,
    pub read_only: bool,
    pub hidden_tables: BTreeSet<String>,
}

/// Connection parameters for one administrable server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerDsn {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub passwd: String,
    pub db: String,
}

/// One administrable server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEntry {
    pub name: String,
    pub dsn: ServerDsn,
    /// Explicit per-server override; `None` means "inherit the global flag".
    pub read_only: Option<bool>,
    /// Explicit per-server hide list; `None` is distinct from an empty set.
    pub hidden_tables: Option<BTreeSet<String>>,
}

/// A user-fillable parameter of an ad-hoc query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryVariable {
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub label: String,
    pub default: Option<VariableValue>,
}

/// One named, runnable report query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdhocQuery {
    pub title: String,
    pub info: Option<String>,
    pub sql: String,
    pub variables: BTreeMap<String, QueryVariable>,
}

impl AdhocQuery {
    /// Substitute `{name}` placeholders in the SQL text.
    ///
    /// Supplied values win over declared defaults; a placeholder with neither
    /// stays verbatim. Booleans render as 1/0, matching what the query editor
    /// sends to the server.
    pub fn render_sql(&self, supplied: &BTreeMap<String, VariableValue>) -> String {
        let mut sql = self.sql.clone();
        for (name, variable) in &self.variables {
            let value = supplied.get(name).or(variable.default.as_ref());
            if let Some(value) = value {
                let placeholder = format!("{{{}}}", name);
                sql = sql.replace(&placeholder, &value.to_sql_fragment());
            }
        }
        sql
    }
}

/// Named group of ad-hoc queries, used for menu grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub queries: Vec<AdhocQuery>,
}

/// Settings owned by the web layer: the session secret plus an open set of
/// keys it applies verbatim (cache headers, template reload, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSettings {
    pub secret_key: String,
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Root aggregate. Fully validated before construction; building it cannot
/// fail partway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub global: GlobalSettings,
    /// Document order, which is also the menu order.
    pub servers: Vec<ServerEntry>,
    /// Lexicographic by name; sorted here, once.
    pub categories: BTreeMap<String, Category>,
    pub web: WebSettings,
}

impl Configuration {
    /// Build the aggregate from a checked raw document.
    ///
    /// Total for any validator output; every fallible check already ran.
    pub fn from_raw(raw: RawDocument) -> Self {
        let global = GlobalSettings {
            default_server: raw.global.default_server,
            read_only: raw.global.read_only,
            hidden_tables: raw.global.hide_tables.into_iter().collect(),
        };

        let servers = raw
            .servers
            .into_iter()
            .map(|server| ServerEntry {
                name: server.name,
                dsn: ServerDsn {
                    host: server.dsn.host,
                    port: server.dsn.port,
                    user: server.dsn.user,
                    passwd: server.dsn.passwd,
                    db: server.dsn.db,
                },
                read_only: server.read_only,
                hidden_tables: server
                    .hide_tables
                    .map(|tables| tables.into_iter().collect()),
            })
            .collect();

        let categories = raw
            .misc
            .into_iter()
            .map(|category| {
                let queries = category
                    .queries
                    .into_iter()
                    .map(|query| AdhocQuery {
                        title: query.title,
                        // The editor hides the info box for empty text.
                        info: if query.info.is_empty() {
                            None
                        } else {
                            Some(query.info)
                        },
                        sql: query.sql,
                        variables: query
                            .variables
                            .into_iter()
                            .map(|(name, variable)| {
                                (
                                    name,
                                    QueryVariable {
                                        kind: variable.kind,
                                        label: variable.label,
                                        default: variable.default,
                                    },
                                )
                            })
                            .collect(),
                    })
                    .collect();
                (
                    category.name.clone(),
                    Category {
                        name: category.name,
                        queries,
                    },
                )
            })
            .collect();

        let web = WebSettings {
            secret_key: raw.web.secret_key,
            extra: raw.web.extra.into_iter().collect(),
        };

        Self {
            global,
            servers,
            categories,
            web,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema;

    fn build(text: &str) -> Configuration {
        let doc = serde_yaml::from_str(text).unwrap();
        Configuration::from_raw(schema::validate(&doc).unwrap())
    }

    const DOC: &str = r#"
global:
  default_server: p1
  read_only: false
  hide_tables: [secrets, secrets, audit_log]
servers:
  p1:
    dsn:
      host: h
      port: "3306"
      user: u
      passwd: x
      db: main
misc:
  b:
    - title: Second
      info: ""
      sql: SELECT 2
  a:
    - title: First
      info: Explains first.
      sql: SELECT 1
web:
  secret_key: s
"#;

    #[test]
    fn test_categories_sorted_lexicographically() {
        let config = build(DOC);
        let names: Vec<_> = config.categories.keys().collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_hide_list_duplicates_collapse() {
        let config = build(DOC);
        assert_eq!(config.global.hidden_tables.len(), 2);
        assert!(config.global.hidden_tables.contains("secrets"));
    }

    #[test]
    fn test_empty_info_normalized_to_none() {
        let config = build(DOC);
        assert_eq!(config.categories["b"].queries[0].info, None);
        assert_eq!(
            config.categories["a"].queries[0].info.as_deref(),
            Some("Explains first.")
        );
    }

    #[test]
    fn test_absent_overrides_stay_unset() {
        let config = build(DOC);
        assert_eq!(config.servers[0].read_only, None);
        assert_eq!(config.servers[0].hidden_tables, None);
    }

    #[test]
    fn test_explicit_empty_hide_list_is_not_unset() {
        let doc = DOC.replace("  p1:\n", "  p1:\n    hide_tables: []\n");
        let config = build(&doc);
        assert_eq!(config.servers[0].hidden_tables, Some(BTreeSet::new()));
    }

    #[test]
    fn test_render_sql_with_defaults_and_supplied_values() {
        let doc = DOC.replace(
            "      sql: SELECT 2\n",
            concat!(
                "      sql: SELECT * FROM t WHERE id = {id} AND active = {active} LIMIT {n}\n",
                "      variables:\n",
                "        id:\n",
                "          type: integer\n",
                "          label: Row id\n",
                "        active:\n",
                "          type: boolean\n",
                "          label: Active only\n",
                "          default: true\n",
                "        n:\n",
                "          type: integer\n",
                "          label: Limit\n",
                "          default: 10\n",
            ),
        );
        let config = build(&doc);
        let query = &config.categories["b"].queries[0];

        let mut supplied = BTreeMap::new();
        supplied.insert("n".to_string(), VariableValue::Int(50));
        let sql = query.render_sql(&supplied);

        // id has no value from anywhere and stays verbatim; the boolean
        // default renders as 1; the supplied limit wins over its default.
        assert_eq!(sql, "SELECT * FROM t WHERE id = {id} AND active = 1 LIMIT 50");
    }

    #[test]
    fn test_port_round_trips_as_integer() {
        let config = build(DOC);
        assert_eq!(config.servers[0].dsn.port, 3306);
    }
}
