//! The closed set of database engines a connection profile can target.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Postgres,
    Mysql,
    /// SQL Server. Its driver calls the endpoint "server" rather than "host".
    Mssql,
    /// File-backed; `database` holds a filesystem path.
    Sqlite,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Postgres,
        EngineKind::Mysql,
        EngineKind::Mssql,
        EngineKind::Sqlite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::Mysql => "mysql",
            EngineKind::Mssql => "mssql",
            EngineKind::Sqlite => "sqlite",
        }
    }

    /// Whether profiles of this kind need host, port and user.
    pub fn is_networked(&self) -> bool {
        !matches!(self, EngineKind::Sqlite)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = UnsupportedEngine;

    /// Exact, case-sensitive match on the wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnsupportedEngine(s.to_string()))
    }
}
