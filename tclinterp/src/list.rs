//! Tcl list syntax.
//!
//! Every value crossing the command channel is a string, and lists are strings written with Tcl's
//! quoting rules. These helpers split such strings into their elements and build them back up.
//!
//! With the `tk` feature, splitting and boolean parsing go through libtcl itself. Without it they
//! are done here, following the same rules and error messages.

#[cfg(not(feature = "tk"))]
use crate::error::{Result, TclError};

#[cfg(feature = "tk")]
pub use crate::tcl::{parse_boolean, split_list};

fn is_list_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

#[cfg(not(feature = "tk"))]
fn backslash_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'v' => '\x0b',
        other => other,
    }
}

/// Split a Tcl list into its elements.
///
/// # Errors
/// This function fails on unmatched braces or quotes, and when a closing brace or quote is
/// followed by something other than whitespace.
#[cfg(not(feature = "tk"))]
pub fn split_list(list: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = list.chars().collect();
    let mut elements = Vec::new();
    let mut i = 0;

    loop {
        while i < chars.len() && is_list_space(chars[i]) {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let mut element = String::new();

        match chars[i] {
            '{' => {
                let mut depth = 1;
                i += 1;
                loop {
                    let c = *chars
                        .get(i)
                        .ok_or_else(|| TclError::new("unmatched open brace in list"))?;
                    match c {
                        '\\' if i + 1 < chars.len() => {
                            // Backslashes are kept verbatim inside braces.
                            element.push(c);
                            element.push(chars[i + 1]);
                            i += 2;
                            continue;
                        }
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    element.push(c);
                    i += 1;
                }

                if let Some(&next) = chars.get(i) {
                    if !is_list_space(next) {
                        return Err(TclError::new(format!(
                            "list element in braces followed by \"{}\" instead of space",
                            next
                        )));
                    }
                }
            }

            '"' => {
                i += 1;
                loop {
                    let c = *chars
                        .get(i)
                        .ok_or_else(|| TclError::new("unmatched open quote in list"))?;
                    match c {
                        '"' => {
                            i += 1;
                            break;
                        }
                        '\\' if i + 1 < chars.len() => {
                            element.push(backslash_char(chars[i + 1]));
                            i += 2;
                        }
                        _ => {
                            element.push(c);
                            i += 1;
                        }
                    }
                }

                if let Some(&next) = chars.get(i) {
                    if !is_list_space(next) {
                        return Err(TclError::new(format!(
                            "list element in quotes followed by \"{}\" instead of space",
                            next
                        )));
                    }
                }
            }

            _ => {
                while i < chars.len() && !is_list_space(chars[i]) {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        element.push(backslash_char(chars[i + 1]));
                        i += 2;
                    } else {
                        element.push(chars[i]);
                        i += 1;
                    }
                }
            }
        }

        elements.push(element);
    }

    Ok(elements)
}

fn braces_balanced(s: &str) -> bool {
    let mut depth: i64 = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Quote a single string so that it is read back as exactly one list element.
pub fn quote_element(s: &str) -> String {
    if s.is_empty() {
        return String::from("{}");
    }

    let needs_quoting = s.starts_with('#')
        || s
            .chars()
            .any(|c| is_list_space(c) || matches!(c, '{' | '}' | '[' | ']' | '$' | '"' | '\\' | ';'));

    if !needs_quoting {
        return s.to_owned();
    }

    if braces_balanced(s) && !s.ends_with('\\') {
        return format!("{{{}}}", s);
    }

    let mut quoted = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        match c {
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if is_list_space(c)
                || matches!(c, '{' | '}' | '[' | ']' | '$' | '"' | '\\' | ';') =>
            {
                quoted.push('\\');
                quoted.push(c);
            }
            c => quoted.push(c),
        }
    }
    if quoted.starts_with('#') {
        quoted.insert(0, '\\');
    }
    quoted
}

/// Build a Tcl list out of its elements.
pub fn merge<I>(elements: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    elements
        .into_iter()
        .map(|element| quote_element(element.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert a Tcl boolean (`1`, `yes`, `on`, `true` and friends) to a Rust bool.
///
/// # Errors
/// This function fails if `s` is not a Tcl boolean.
#[cfg(not(feature = "tk"))]
pub fn parse_boolean(s: &str) -> Result<bool> {
    let lower = s.trim().to_ascii_lowercase();
    match lower.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => match lower.parse::<i64>() {
            Ok(n) => Ok(n != 0),
            Err(_) => Err(TclError::expected("boolean value", s)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        assert_eq!(split_list("a b  c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(split_list("").unwrap(), Vec::<String>::new());
        assert_eq!(split_list("   ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_split_braces_and_quotes() {
        assert_eq!(
            split_list("{c and d} {} {a {nested}} \"x y\"").unwrap(),
            vec!["c and d", "", "a {nested}", "x y"]
        );
        assert_eq!(split_list("a\\ b c").unwrap(), vec!["a b", "c"]);
    }

    #[test]
    fn test_split_errors() {
        assert!(split_list("{abc").is_err());
        assert!(split_list("\"abc").is_err());
        assert_eq!(
            split_list("{a}b").unwrap_err().message(),
            "list element in braces followed by \"b\" instead of space"
        );
    }

    #[test]
    fn test_merge_quoting() {
        let elements = vec!["plain", "", "with space", "{unbalanced", "#hash", "tab\there"];
        let merged = merge(&elements);
        assert_eq!(split_list(&merged).unwrap(), elements);
        assert_eq!(merge(&["a", "b c", ""]), "a {b c} {}");
    }

    #[test]
    fn test_parse_boolean() {
        assert!(parse_boolean("yes").unwrap());
        assert!(parse_boolean("1").unwrap());
        assert!(!parse_boolean("off").unwrap());
        assert!(!parse_boolean("FALSE").unwrap());
        assert_eq!(
            parse_boolean("maybe").unwrap_err().message(),
            "expected boolean value but got \"maybe\""
        );
    }
}
