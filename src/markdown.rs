use html2md::{Handle, StructuredPrinter, TagHandler, TagHandlerFactory};
use std::collections::HashMap;

/// Characters html2md backslash-escapes in running text.
const ESCAPED: &[char] = &['<', '>', '*', '\\', '_', '~', '=', '+', '-', '#'];

/// Convert a problem description to readable markdown. Links keep only their
/// text and lines are never wrapped.
pub fn html_to_markdown(html: &str) -> String {
    let mut handlers: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
    handlers.insert("a".into(), Box::new(Factory(|| Box::new(Unwrap))));
    handlers.insert("sup".into(), Box::new(Factory(|| Box::new(Superscript))));
    for tag in ["script", "style"] {
        handlers.insert(tag.into(), Box::new(Factory(|| Box::new(Hidden))));
    }

    tidy(&html2md::parse_html_custom(html, &handlers))
}

struct Factory(fn() -> Box<dyn TagHandler>);

impl TagHandlerFactory for Factory {
    fn instantiate(&self) -> Box<dyn TagHandler> {
        (self.0)()
    }
}

/// Keeps the children, drops the tag.
struct Unwrap;

impl TagHandler for Unwrap {
    fn handle(&mut self, _tag: &Handle, _printer: &mut StructuredPrinter) {}

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}
}

/// Drops the tag and everything inside it.
struct Hidden;

impl TagHandler for Hidden {
    fn handle(&mut self, _tag: &Handle, _printer: &mut StructuredPrinter) {}

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}

    fn skip_descendants(&self) -> bool {
        true
    }
}

/// `10<sup>4</sup>` reads as `10^4`.
struct Superscript;

impl TagHandler for Superscript {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        printer.append_str("^");
    }

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}
}

/// Undo html2md's escaping outside code fences, turn non-breaking spaces into
/// plain ones, drop trailing spaces and keep at most one blank line in a row.
fn tidy(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        let line = line.trim_end();
        if line.starts_with("```") {
            if in_fence {
                while lines.last().is_some_and(|l| l.is_empty()) {
                    lines.pop();
                }
            }
            in_fence = !in_fence;
            lines.push(line.to_string());
            continue;
        }
        if in_fence {
            lines.push(line.to_string());
            continue;
        }

        let line = unescape(line).replace('\u{a0}', " ");
        let line = line.trim_end();
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line.to_string());
    }
    lines.join("\n").trim().to_string()
}

fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if ESCAPED.contains(&next) => out.push(next),
            Some(next) => {
                out.push(c);
                out.push(next);
            }
            None => out.push(c),
        }
    }
    out
}
