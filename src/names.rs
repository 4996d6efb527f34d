//! Symbol naming for generated code
//!
//! Generated files cross-reference each other, so every emitter derives
//! symbols the same way: strip characters that are not valid in C-family
//! identifiers, then case-fold as the symbol kind requires.

/// Strip non-identifier characters from a name.
///
/// Keeps ASCII alphanumerics and underscores; prefixes an underscore when the
/// result would start with a digit.
///
/// # Examples
/// ```
/// use fsmconvert::names::sanitize_identifier;
/// assert_eq!(sanitize_identifier("Ping Pong"), "PingPong");
/// assert_eq!(sanitize_identifier("2fast"), "_2fast");
/// ```
pub fn sanitize_identifier(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match cleaned.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{cleaned}"),
        _ => cleaned,
    }
}

/// Lowercase identifier form, used for function names (`fsm_<name>_init`).
///
/// # Examples
/// ```
/// use fsmconvert::names::lowercased;
/// assert_eq!(lowercased("CounterC"), "counterc");
/// ```
pub fn lowercased(name: &str) -> String {
    sanitize_identifier(name).to_lowercase()
}

/// Uppercase identifier form, used for macros and include guards.
///
/// # Examples
/// ```
/// use fsmconvert::names::uppercased;
/// assert_eq!(uppercased("CounterC"), "COUNTERC");
/// ```
pub fn uppercased(name: &str) -> String {
    sanitize_identifier(name).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_punctuation() {
        assert_eq!(sanitize_identifier("My-Machine!"), "MyMachine");
        assert_eq!(sanitize_identifier("a b c"), "abc");
        assert_eq!(sanitize_identifier("keep_underscores"), "keep_underscores");
    }

    #[test]
    fn sanitize_guards_leading_digit() {
        assert_eq!(sanitize_identifier("42nd"), "_42nd");
        assert_eq!(sanitize_identifier(""), "");
    }

    #[test]
    fn case_folding() {
        assert_eq!(lowercased("Suspend Counter"), "suspendcounter");
        assert_eq!(uppercased("Suspend Counter"), "SUSPENDCOUNTER");
    }
}
