//! `{dotted.path}` substitution for dictionary templates.
//!
//! A template is rendered against a layered context: every path is first walked from the
//! primary value (the whole round record) and, if any segment misses, walked again from the
//! start against the fallback value (the current event's `data`). Whole-key overrides such as
//! `id` and `map` win over both layers.
//!
//! Values that are present but falsy (`null`, `false`, `0`, `""`) render as the empty string,
//! the same as a path that resolves nowhere.

use serde_json::{Number, Value};

/// Context a single template is rendered against
#[derive(Debug)]
pub struct Placeholders<'a> {
    primary: &'a Value,
    fallback: Option<&'a Value>,
    overrides: Vec<(&'a str, String)>,
}

impl<'a> Placeholders<'a> {
    pub fn new(primary: &'a Value) -> Self {
        Self {
            primary,
            fallback: None,
            overrides: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: &'a Value) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Substitute `value` whenever the whole placeholder key equals `key`.
    pub fn with_override(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.overrides.push((key, value.into()));
        self
    }

    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if close > 0 => {
                    out.push_str(&self.resolve(&after[..close]));
                    rest = &after[close + 1..];
                }
                // `{}` is not a placeholder
                Some(_) => {
                    out.push('{');
                    rest = after;
                }
                None => {
                    out.push_str(&rest[open..]);
                    return out;
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn resolve(&self, key: &str) -> String {
        if let Some((_, value)) = self.overrides.iter().find(|(k, _)| *k == key) {
            return value.clone();
        }

        let path: Vec<&str> = key.split('.').collect();
        let found = walk(self.primary, &path)
            .or_else(|| self.fallback.and_then(|fallback| walk(fallback, &path)));

        match found {
            Some(value) => display(value, true),
            None => {
                tracing::debug!(placeholder = key, "unresolved placeholder");
                String::new()
            }
        }
    }
}

fn walk<'v>(root: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Text form of a resolved value. Sequence elements are joined with `,` and keep their
/// falsy values; only the top-level value collapses.
fn display(value: &Value, collapse_falsy: bool) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => {
            if !b && collapse_falsy {
                String::new()
            } else {
                b.to_string()
            }
        }
        Value::Number(n) => {
            if collapse_falsy && n.as_f64() == Some(0.0) {
                String::new()
            } else {
                number_text(n)
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| display(item, false))
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops a trailing `.0`
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}
