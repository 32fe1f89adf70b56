//! Trace print formatting.
//!
//! Log and print tooling renders trace states through a small placeholder
//! language:
//!
//! | Placeholder | Meaning |
//! |-------------|---------|
//! | `%i` | trace index |
//! | `%j` | state index within the trace |
//! | `%label` | integer label of the current arc |
//! | `%node` | target node name |
//! | `%text` | accepted text |
//! | `%type` | state significance (0/1/2) |
//! | `%list` | visible-variable dump |
//! | `%:name`, `%{:name}` | value of the trace variable `name` |
//!
//! The escapes `\t` and `\n` expand to tab and newline. Unknown
//! placeholders render as themselves in `%{...}` form.

use crate::parser::Parser;
use regex::{Captures, Regex};

/// A compiled trace format string.
pub struct TraceFormat {
    format: String,
    subst: Regex,
}

impl TraceFormat {
    pub fn new(format: &str) -> Self {
        TraceFormat {
            format: format.replace("\\t", "\t").replace("\\n", "\n"),
            subst: Regex::new(r"%(\{(:?\w+)\}|:?\w+)")
                .expect("placeholder pattern is well-formed"),
        }
    }

    /// Renders the current trace state of `parser`.
    pub fn render(&self, parser: &Parser) -> String {
        self.subst
            .replace_all(&self.format, |caps: &Captures<'_>| {
                let field = caps
                    .get(2)
                    .or_else(|| caps.get(1))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                if let Some(name) = field.strip_prefix(':') {
                    return parser.get(name).as_string();
                }
                match field {
                    "i" => parser.trace_index().to_string(),
                    "j" => parser.state_index().to_string(),
                    "label" => parser.label().to_string(),
                    "node" => parser.node(),
                    "text" => parser.text(),
                    "type" => parser.state_kind().to_string(),
                    "list" => parser
                        .list_visible()
                        .iter()
                        .map(|(key, value)| format!("{}\t{}", key, value.as_string()))
                        .collect::<Vec<_>>()
                        .join("\n"),
                    other => format!("%{{{}}}", other),
                }
            })
            .into_owned()
    }
}
