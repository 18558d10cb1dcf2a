use std::sync::Arc;

use serde::{Deserialize, Serialize};

use legendql_sql::generator::{self, SqlToStringGenerator};
use legendql_sql::{SqlFormat, SqlToStringConfig};

use crate::Result;

const PURE_INDENT: &str = "  ";

/// Options for rendering a frame to SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameToSqlConfig {
    /// Tag of the SQL generator to render with. Must match exactly one
    /// registered generator.
    ///
    /// Defaults to `Postgres`.
    pub database_type: String,

    /// Break clauses onto their own indented lines.
    ///
    /// Defaults to true.
    pub pretty: bool,
}

impl Default for FrameToSqlConfig {
    fn default() -> Self {
        FrameToSqlConfig {
            database_type: "Postgres".to_string(),
            pretty: true,
        }
    }
}

impl FrameToSqlConfig {
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn no_pretty(self) -> Self {
        self.with_pretty(false)
    }

    pub fn with_database_type<S: Into<String>>(mut self, database_type: S) -> Self {
        self.database_type = database_type.into();
        self
    }

    pub fn sql_to_string_generator(&self) -> Result<Arc<dyn SqlToStringGenerator>> {
        generator::find(&self.database_type)
    }

    pub(crate) fn sql_to_string_config(&self) -> SqlToStringConfig {
        let format = if self.pretty {
            SqlFormat::default()
        } else {
            SqlFormat::compact()
        };
        SqlToStringConfig::new(format)
    }
}

/// Options for rendering a frame to PURE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameToPureConfig {
    /// Put each step of the pipeline on its own line.
    ///
    /// Defaults to true.
    pub pretty: bool,

    pub indent_count: usize,
}

impl Default for FrameToPureConfig {
    fn default() -> Self {
        FrameToPureConfig {
            pretty: true,
            indent_count: 0,
        }
    }
}

impl FrameToPureConfig {
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn no_pretty(self) -> Self {
        self.with_pretty(false)
    }

    pub fn push_indent(&self, levels: usize) -> Self {
        FrameToPureConfig {
            indent_count: self.indent_count + levels,
            ..*self
        }
    }

    /// Whitespace between two tokens, `delta` levels deeper than the current
    /// indentation.
    ///
    /// Compact output drops the whitespace altogether, unless
    /// `force_newline` asks for a separation, in which case it is a single
    /// space.
    pub fn separator(&self, delta: usize, force_newline: bool) -> String {
        if self.pretty {
            format!("\n{}", PURE_INDENT.repeat(self.indent_count + delta))
        } else if force_newline {
            " ".to_string()
        } else {
            String::new()
        }
    }
}

#[cfg(feature = "serde_yaml")]
mod yaml {
    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use super::{FrameToPureConfig, FrameToSqlConfig};
    use crate::{Error, Result};

    fn from_yaml<T: DeserializeOwned>(s: &str, what: &str) -> Result<T> {
        serde_yaml::from_str(s).map_err(|e| Error::validation(format!("Invalid {what} config: {e}")))
    }

    fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
        serde_yaml::to_string(value).map_err(|e| Error::new_assert(e.to_string()))
    }

    impl FrameToSqlConfig {
        /// Reads a config from YAML. Missing keys take their default value.
        pub fn from_yaml(s: &str) -> Result<Self> {
            from_yaml(s, "sql")
        }

        pub fn to_yaml(&self) -> Result<String> {
            to_yaml(self)
        }
    }

    impl FrameToPureConfig {
        pub fn from_yaml(s: &str) -> Result<Self> {
            from_yaml(s, "pure")
        }

        pub fn to_yaml(&self) -> Result<String> {
            to_yaml(self)
        }
    }
}
