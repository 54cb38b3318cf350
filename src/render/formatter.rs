//! Cell formatters, the value extractor, and the sanitizer seam.
//!
//! A formatter turns a raw item value into cell content. Resolution
//! order is column formatter, then row-metadata override, then the
//! global default (an escaping passthrough). Formatter output crosses
//! the injection trust boundary: everything a formatter or editor
//! produces is passed through the configured sanitizer before it is
//! stored on a node. With no sanitizer configured the content passes
//! through unchanged; the integrator owns that boundary.

use std::rc::Rc;

use serde_json::Value;

use crate::types::Column;

/// Input to a formatter call.
pub struct FormatterContext<'a> {
    /// Row index of the cell being formatted.
    pub row: usize,
    /// Display-order column index.
    pub cell: usize,
    /// Extracted value for the cell, if any.
    pub value: Option<&'a Value>,
    /// The column definition.
    pub column: &'a Column,
    /// The whole row item; `None` for a present-but-unloaded row.
    pub item: Option<&'a Value>,
}

/// What a formatter returns: plain text, or text plus class/tooltip
/// adjustments applied to the cell node.
pub enum FormatterResult {
    /// Plain content.
    Text(String),
    /// Content with class additions/removals and an optional tooltip.
    Rich(RichFormat),
}

/// Structured formatter output.
#[derive(Default)]
pub struct RichFormat {
    pub text: String,
    pub add_classes: Vec<String>,
    pub remove_classes: Vec<String>,
    pub tool_tip: Option<String>,
}

impl FormatterResult {
    /// The content string regardless of variant.
    pub fn text(&self) -> &str {
        match self {
            FormatterResult::Text(t) => t,
            FormatterResult::Rich(r) => &r.text,
        }
    }
}

/// A cell formatter.
pub type Formatter = Rc<dyn Fn(&FormatterContext<'_>) -> FormatterResult>;

/// Sanitizer applied to every formatter/editor-produced string before
/// it is stored on a node.
pub type Sanitizer = Rc<dyn Fn(&str) -> String>;

/// Pulls the cell value out of a row item for a column. The default
/// is a direct field lookup by `column.field`.
pub type ValueExtractor = Rc<dyn Fn(&Value, &Column) -> Option<Value>>;

/// Default value extraction: direct field lookup on a JSON object.
pub fn extract_field<'a>(item: &'a Value, column: &Column) -> Option<&'a Value> {
    item.get(column.field.as_str())
}

/// Render a JSON value the way it should read in a cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// The global default formatter: escape and pass the value through.
pub fn default_formatter(ctx: &FormatterContext<'_>) -> FormatterResult {
    match ctx.value {
        Some(v) => FormatterResult::Text(escape_html(&display_value(v))),
        None => FormatterResult::Text(String::new()),
    }
}

/// Minimal HTML escaping for the default formatter's passthrough.
pub fn escape_html(s: &str) -> String {
    if !s.contains(['&', '<', '>', '"']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
