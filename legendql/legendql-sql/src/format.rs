use serde::{Deserialize, Serialize};

const SQL_INDENT: &str = "    ";

/// Layout of rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlFormat {
    /// Break clauses onto their own indented lines.
    pub pretty: bool,

    pub indent_count: usize,
}

impl Default for SqlFormat {
    fn default() -> Self {
        SqlFormat {
            pretty: true,
            indent_count: 0,
        }
    }
}

impl SqlFormat {
    pub fn compact() -> Self {
        SqlFormat {
            pretty: false,
            indent_count: 0,
        }
    }

    pub fn push_indent(&self) -> Self {
        SqlFormat {
            indent_count: self.indent_count + 1,
            ..*self
        }
    }

    /// Whitespace between two tokens `delta` levels deeper than the current
    /// indentation. A single space in compact mode.
    pub fn separator(&self, delta: usize) -> String {
        if self.pretty {
            format!("\n{}", SQL_INDENT.repeat(self.indent_count + delta))
        } else {
            " ".to_string()
        }
    }

    /// Whitespace right inside a parenthesis. Empty in compact mode, so that
    /// compact output reads `(SELECT ...)`.
    pub fn paren_separator(&self, delta: usize) -> String {
        if self.pretty {
            self.separator(delta)
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlToStringConfig {
    pub format: SqlFormat,
}

impl SqlToStringConfig {
    pub fn new(format: SqlFormat) -> Self {
        SqlToStringConfig { format }
    }

    pub fn push_indent(&self) -> Self {
        SqlToStringConfig {
            format: self.format.push_indent(),
        }
    }

    pub(crate) fn sep(&self, delta: usize) -> String {
        self.format.separator(delta)
    }

    pub(crate) fn paren_sep(&self, delta: usize) -> String {
        self.format.paren_separator(delta)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_separator() {
        let pretty = SqlFormat::default().push_indent();
        assert_eq!(pretty.separator(0), "\n    ");
        assert_eq!(pretty.separator(2), "\n            ");

        let compact = SqlFormat::compact().push_indent();
        assert_eq!(compact.separator(3), " ");
        assert_eq!(compact.paren_separator(1), "");
        assert_eq!(pretty.paren_separator(1), "\n        ");
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: SqlToStringConfig =
            serde_json::from_str(r#"{"format": {"pretty": false}}"#).unwrap();
        assert_eq!(config.format, SqlFormat::compact());
    }
}
