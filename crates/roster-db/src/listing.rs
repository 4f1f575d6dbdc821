//! Helpers shared by the list queries: dynamic WHERE clauses, whitelisted
//! ORDER BY keys and limit clamping.

use rusqlite::types::Value;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// 0 means "use the default"; anything above the maximum is capped.
pub fn clamp_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}

/// One ORDER BY term. The column always comes from a static whitelist, so it
/// is safe to format into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub descending: bool,
}

impl SortKey {
    /// Resolves `name` or `-name` against `(key, column)` pairs.
    pub fn parse(spec: &str, allowed: &[(&str, &'static str)]) -> Option<Self> {
        let spec = spec.trim();
        let (key, descending) = match spec.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (spec, false),
        };
        allowed
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, column)| SortKey {
                column,
                descending,
            })
    }
}

/// AND-combined conditions with their positional parameters.
#[derive(Debug, Default)]
pub struct Conditions {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Conditions {
    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(format!("{column} = ?"));
        self.params.push(value.into());
        self
    }

    /// Case-insensitive substring match.
    pub fn contains(&mut self, column: &str, needle: &str) -> &mut Self {
        self.clauses.push(format!("{column} LIKE ? ESCAPE '\\'"));
        self.params.push(Value::Text(format!("%{}%", escape_like(needle))));
        self
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Appends WHERE, ORDER BY and LIMIT to `base`.
    pub fn to_sql(&self, base: &str, sort: &[SortKey], tiebreak: &str, limit: u32) -> String {
        let mut sql = String::from(base);
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        for key in sort {
            sql.push_str(key.column);
            if key.descending {
                sql.push_str(" DESC");
            }
            sql.push_str(", ");
        }
        sql.push_str(tiebreak);
        sql.push_str(&format!(" LIMIT {}", clamp_limit(limit)));
        sql
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
