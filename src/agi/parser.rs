//! Parser for the AGI variable block.

use std::collections::HashMap;

/// AGI variables keyed by name (`agi_channel`, `agi_callerid`, `agi_dnid`, …).
pub type Variables = HashMap<String, String>;

/// Separator between a variable name and its value.
pub const SEPARATOR: &str = ": ";

/// Parse a block of `name: value` lines into a [`Variables`] map.
///
/// The text is split on `\n`. A line is kept only when splitting it on
/// [`SEPARATOR`] yields exactly two parts, so the following are dropped
/// without error:
///
/// - blank lines, including the terminating empty line;
/// - lines with no separator;
/// - lines with more than one separator, e.g. `x: y: z`. Such lines are
///   ambiguous and are not truncated at the first occurrence.
///
/// Nothing is trimmed: a trailing `\r` stays part of the value. When a name
/// repeats, the last occurrence wins.
///
/// # Examples
///
/// ```rust
/// use agi_link::agi::parse_variables;
///
/// let vars = parse_variables("agi_dnid: 100\nbroken\nagi_channel: SIP/1\n\n");
/// assert_eq!(vars.len(), 2);
/// assert_eq!(vars["agi_dnid"], "100");
/// ```
#[must_use]
pub fn parse_variables(text: &str) -> Variables {
    text.split('\n').filter_map(parse_line).collect()
}

/// Split a single line into a `(name, value)` pair.
fn parse_line(line: &str) -> Option<(String, String)> {
    let mut parts = line.split(SEPARATOR);
    let name = parts.next()?;
    let value = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((name.to_owned(), value.to_owned()))
}
