//! Code-building helpers shared by all language bindings
//!
//! Pure text transformations with no model knowledge. Emitters compose these
//! so that every generated file gets the same indentation, bracing, and
//! include-guard structure.

use crate::names::uppercased;

/// Join lines into a newline-terminated block. Empty input yields an empty
/// string.
pub fn block<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// Indent every non-empty line of `body` by `indent`.
pub fn indented(body: &str, indent: &str) -> String {
    let mut out = String::new();
    for line in body.lines() {
        if !line.is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Wrap `body` in a pair of delimiter lines.
pub fn delimited(open: &str, body: &str, close: &str) -> String {
    let mut out = String::new();
    out.push_str(open);
    out.push('\n');
    out.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(close);
    out.push('\n');
    out
}

/// Deterministic include-guard token for a logical file name.
///
/// `Machine_Counter.h` becomes `MACHINE_COUNTER_H`.
pub fn guard_token(logical_name: &str) -> String {
    uppercased(&logical_name.replace(['.', '-', ' '], "_"))
}

/// Wrap `body` in an include guard derived from `logical_name`.
pub fn include_guarded(logical_name: &str, body: &str) -> String {
    let token = guard_token(logical_name);
    let mut out = String::new();
    out.push_str(&format!("#ifndef {token}\n#define {token}\n\n"));
    out.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("\n#endif /* {token} */\n"));
    out
}

/// Map a template over a sequence, joining the results into a block.
pub fn for_each<T, F>(items: &[T], mut template: F) -> String
where
    F: FnMut(&T) -> String,
{
    block(items.iter().map(|item| template(item)))
}

/// Like [`for_each`], but the template also receives the item's index.
pub fn for_each_indexed<T, F>(items: &[T], mut template: F) -> String
where
    F: FnMut(usize, &T) -> String,
{
    block(
        items
            .iter()
            .enumerate()
            .map(|(index, item)| template(index, item)),
    )
}
