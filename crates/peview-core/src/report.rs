//! Hierarchical report protocol.
//!
//! Parsed structures describe themselves through a [`Report`] visitor:
//! `begin` opens a named group, `end` closes the innermost open group and
//! `write` emits one leaf tagged with a [`ValueKind`] that selects the
//! rendering. Two renderers are provided, one for human-readable text and
//! one producing a JSON document.

use chrono::DateTime;
use serde_json::{json, Map, Value as Json};

/// Semantic kind of a written value; selects the formatter in each renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Count,
    Raw,
    Address,
    Datetime,
    Enum,
    Flags,
    Alignment,
    Version,
    Size,
}

/// A leaf value handed to [`Report::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    None,
    Unsigned(u64),
    Str(String),
    List(Vec<u64>),
    Version(u16, u16),
    /// Symbolic name plus raw numeric value, for enums and flag sets.
    Symbolic { name: String, value: u64 },
}

/// Receiver for the hierarchical description of a parse result.
pub trait Report {
    /// Opens a named group.
    fn begin(&mut self, name: &str);
    /// Closes the innermost open group.
    fn end(&mut self);
    /// Emits one leaf value.
    fn write(&mut self, name: &str, value: Value, kind: ValueKind);
}

fn format_datetime(secs: u64) -> String {
    match DateTime::from_timestamp(secs as i64, 0) {
        Some(t) => t.format("%d.%m.%Y %H:%M:%S").to_string(),
        None => "<invalid time>".to_string(),
    }
}

fn format_size(value: u64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "G", "T"];
    let mut v = value as f64;
    let mut div = 0;
    while v >= 512.0 && div < SUFFIXES.len() - 1 {
        v /= 1024.0;
        div += 1;
    }
    if v.fract() == 0.0 {
        format!("{}{}B", v as u64, SUFFIXES[div])
    } else {
        format!("{:.2}{}B", v, SUFFIXES[div])
    }
}

fn format_alignment(value: u64) -> Option<u32> {
    if value.count_ones() == 1 {
        Some(value.trailing_zeros())
    } else {
        None
    }
}

/// Renders a report as indented text.
#[derive(Debug, Default)]
pub struct TextReport {
    buf: String,
    depth: usize,
}

impl TextReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the report, returning the rendered text.
    pub fn finish(self) -> String {
        self.buf
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn format(value: &Value, kind: ValueKind) -> String {
        match (kind, value) {
            (ValueKind::Raw, Value::None) => "<none>".to_string(),
            (ValueKind::Raw | ValueKind::Count, Value::Str(s)) => s.clone(),
            (ValueKind::Raw | ValueKind::Count, Value::Unsigned(v)) => v.to_string(),
            (ValueKind::Count, Value::List(items)) => format!("{items:?}"),
            (ValueKind::Address, Value::Unsigned(v)) => format!("{v:#x}"),
            (ValueKind::Datetime, Value::Unsigned(v)) => format_datetime(*v),
            (ValueKind::Enum | ValueKind::Flags, Value::Symbolic { name, .. }) => name.clone(),
            (ValueKind::Alignment, Value::Unsigned(v)) => match format_alignment(*v) {
                Some(exp) => format!("2^{exp}"),
                None => format!("<bad alignment {v:#x}>"),
            },
            (ValueKind::Version, Value::Version(major, minor)) => format!("{major}.{minor}"),
            (ValueKind::Size, Value::Unsigned(v)) => format_size(*v),
            (_, other) => format!("{other:?}"),
        }
    }
}

impl Report for TextReport {
    fn begin(&mut self, name: &str) {
        let header = format!("{name}:");
        self.line(&header);
        self.depth += 1;
    }

    fn end(&mut self) {
        self.buf.push('\n');
        self.depth = self.depth.saturating_sub(1);
    }

    fn write(&mut self, name: &str, value: Value, kind: ValueKind) {
        let entry = format!("{name}: {}", Self::format(&value, kind));
        self.line(&entry);
    }
}

/// Builds a JSON document from a report.
#[derive(Debug, Default)]
pub struct JsonReport {
    root: Map<String, Json>,
    stack: Vec<(String, Map<String, Json>)>,
}

impl JsonReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the report, returning the JSON document. Any groups still
    /// open are closed first.
    pub fn finish(mut self) -> Json {
        while !self.stack.is_empty() {
            self.end();
        }
        Json::Object(self.root)
    }

    fn top(&mut self) -> &mut Map<String, Json> {
        match self.stack.last_mut() {
            Some((_, map)) => map,
            None => &mut self.root,
        }
    }

    fn encode(value: &Value, kind: ValueKind) -> Json {
        match kind {
            ValueKind::Count | ValueKind::Raw | ValueKind::Address | ValueKind::Size => {
                match value {
                    Value::None => Json::Null,
                    Value::Unsigned(v) => json!(v),
                    Value::Str(s) => json!(s),
                    Value::List(items) => json!(items),
                    Value::Version(major, minor) => json!([major, minor]),
                    Value::Symbolic { value, .. } => json!(value),
                }
            }
            ValueKind::Datetime => match value {
                Value::Unsigned(v) => json!(format_datetime(*v)),
                other => json!(format!("{other:?}")),
            },
            ValueKind::Enum | ValueKind::Flags => match value {
                Value::Symbolic { value, .. } => json!(value),
                Value::Unsigned(v) => json!(v),
                other => json!(format!("{other:?}")),
            },
            ValueKind::Alignment => match value {
                Value::Unsigned(v) => match format_alignment(*v) {
                    Some(exp) => json!(exp),
                    None => json!(format!("<bad alignment {v:#x}>")),
                },
                other => json!(format!("{other:?}")),
            },
            ValueKind::Version => match value {
                Value::Version(major, minor) => json!([major, minor]),
                other => json!(format!("{other:?}")),
            },
        }
    }
}

impl Report for JsonReport {
    fn begin(&mut self, name: &str) {
        self.stack.push((name.to_string(), Map::new()));
    }

    fn end(&mut self) {
        if let Some((name, map)) = self.stack.pop() {
            self.top().insert(name, Json::Object(map));
        }
    }

    fn write(&mut self, name: &str, value: Value, kind: ValueKind) {
        let encoded = Self::encode(&value, kind);
        self.top().insert(name.to_string(), encoded);
    }
}
