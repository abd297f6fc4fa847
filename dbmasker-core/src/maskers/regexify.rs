//! Random strings matching a regular expression.
//!
//! Supported: literals, escapes (`\d \w \s`, their negations, escaped
//! metacharacters), `.`, character classes with ranges and negation, groups
//! with alternation, and the quantifiers `? * + {n} {n,} {n,m}`. Anchors are
//! dropped. Open-ended repetition adds at most eight extra repetitions.

use crate::Result;
use crate::error::DbMaskerError;
use rand::Rng;
use rand::seq::IndexedRandom;

const UNBOUNDED_EXTRA: usize = 8;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(char),
    Set(Vec<char>),
    Alternation(Vec<Vec<Node>>),
    Repeat { node: Box<Node>, min: usize, max: usize },
}

enum ClassItem {
    Char(char),
    Set(Vec<char>),
}

fn unsupported(message: impl Into<String>) -> DbMaskerError {
    DbMaskerError::masking("regexify", message)
}

fn printable() -> impl Iterator<Item = char> {
    (0x20u8..=0x7e).map(char::from)
}

fn alphanumeric() -> Vec<char> {
    ('a'..='z').chain('A'..='Z').chain('0'..='9').collect()
}

fn word_chars() -> Vec<char> {
    let mut chars = alphanumeric();
    chars.push('_');
    chars
}

fn complement(excluded: &[char]) -> Vec<char> {
    printable().filter(|c| !excluded.contains(c)).collect()
}

/// Escapes that stand for a set of characters, such as `\d`.
fn shorthand_class(escape: char) -> Option<Vec<char>> {
    match escape {
        'd' => Some(('0'..='9').collect()),
        'w' => Some(word_chars()),
        's' => Some(vec![' ']),
        'D' => Some(complement(&('0'..='9').collect::<Vec<_>>())),
        'W' => Some(complement(&word_chars())),
        'S' => Some(complement(&[' '])),
        _ => None,
    }
}

/// Escapes that stand for a single character.
fn escaped_char(escape: char) -> Result<char> {
    match escape {
        'n' => Ok('\n'),
        't' => Ok('\t'),
        'r' => Ok('\r'),
        c if c.is_ascii_alphanumeric() => Err(unsupported(format!("escape \\{}", c))),
        c => Ok(c),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn parse_alternation(&mut self) -> Result<Vec<Vec<Node>>> {
        let mut branches = vec![self.parse_sequence()?];
        while self.peek() == Some('|') {
            self.pos += 1;
            branches.push(self.parse_sequence()?);
        }
        Ok(branches)
    }

    fn parse_sequence(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            if let Some(atom) = self.parse_atom()? {
                nodes.push(self.parse_quantifier(atom)?);
            }
        }
        Ok(nodes)
    }

    fn parse_atom(&mut self) -> Result<Option<Node>> {
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let node = match c {
            '^' | '$' => return Ok(None),
            '*' | '+' | '?' => return Err(unsupported(format!("dangling quantifier '{}'", c))),
            '(' => {
                if self.peek() == Some('?') {
                    self.pos += 1;
                    if self.bump() != Some(':') {
                        return Err(unsupported("group flags and lookaround"));
                    }
                }
                let branches = self.parse_alternation()?;
                if self.bump() != Some(')') {
                    return Err(unsupported("unclosed group"));
                }
                Node::Alternation(branches)
            }
            '[' => Node::Set(self.parse_class()?),
            '.' => Node::Set(alphanumeric()),
            '\\' => {
                let escape = self
                    .bump()
                    .ok_or_else(|| unsupported("trailing backslash"))?;
                match escape {
                    'b' | 'B' | 'A' | 'z' => return Ok(None),
                    _ => match shorthand_class(escape) {
                        Some(set) => Node::Set(set),
                        None => Node::Literal(escaped_char(escape)?),
                    },
                }
            }
            other => Node::Literal(other),
        };

        Ok(Some(node))
    }

    fn parse_quantifier(&mut self, node: Node) -> Result<Node> {
        let (min, max) = match self.peek() {
            Some('?') => {
                self.pos += 1;
                (0, 1)
            }
            Some('*') => {
                self.pos += 1;
                (0, UNBOUNDED_EXTRA)
            }
            Some('+') => {
                self.pos += 1;
                (1, 1 + UNBOUNDED_EXTRA)
            }
            Some('{') => match self.parse_counted()? {
                Some(bounds) => bounds,
                None => return Ok(node),
            },
            _ => return Ok(node),
        };

        // Lazy and possessive suffixes do not change what can match
        if matches!(self.peek(), Some('?' | '+')) {
            self.pos += 1;
        }

        Ok(Node::Repeat {
            node: Box::new(node),
            min,
            max,
        })
    }

    /// Parses `{n}`, `{n,}` or `{n,m}` at the cursor; `None` leaves `{` literal.
    fn parse_counted(&mut self) -> Result<Option<(usize, usize)>> {
        let rest: String = self.chars[self.pos + 1..].iter().collect();
        let Some(end) = rest.find('}') else {
            return Ok(None);
        };

        let body = &rest[..end];
        let number = |s: &str| s.trim().parse::<usize>().ok();
        let bounds = match body.split_once(',') {
            None => number(body).map(|n| (n, n)),
            Some((low, "")) => number(low).map(|n| (n, n + UNBOUNDED_EXTRA)),
            Some((low, high)) => number(low).zip(number(high)),
        };

        let Some((min, max)) = bounds else {
            return Ok(None);
        };
        if min > max {
            return Err(unsupported(format!("invalid repetition {{{}}}", body)));
        }

        // body is ASCII here, so its byte length is its char count
        self.pos += end + 2;
        Ok(Some((min, max)))
    }

    fn parse_class_item(&mut self) -> Result<ClassItem> {
        let c = self
            .bump()
            .ok_or_else(|| unsupported("unclosed character class"))?;
        match c {
            '\\' => {
                let escape = self
                    .bump()
                    .ok_or_else(|| unsupported("unclosed character class"))?;
                match shorthand_class(escape) {
                    Some(set) => Ok(ClassItem::Set(set)),
                    None => Ok(ClassItem::Char(escaped_char(escape)?)),
                }
            }
            '[' if self.peek() == Some(':') => Err(unsupported("POSIX character classes")),
            other => Ok(ClassItem::Char(other)),
        }
    }

    fn parse_class(&mut self) -> Result<Vec<char>> {
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }

        let mut members = Vec::new();
        let mut first = true;
        loop {
            if self.peek() == Some(']') && !first {
                self.pos += 1;
                break;
            }
            first = false;

            match self.parse_class_item()? {
                ClassItem::Set(set) => members.extend(set),
                ClassItem::Char(start) => {
                    let is_range = self.peek() == Some('-')
                        && self.chars.get(self.pos + 1).is_some_and(|c| *c != ']');
                    if is_range {
                        self.pos += 1;
                        let ClassItem::Char(end) = self.parse_class_item()? else {
                            return Err(unsupported("range ending in a class shorthand"));
                        };
                        if end < start {
                            return Err(unsupported(format!("invalid range {}-{}", start, end)));
                        }
                        members.extend(start..=end);
                    } else {
                        members.push(start);
                    }
                }
            }
        }

        let members = if negated {
            complement(&members)
        } else {
            members
        };

        if members.is_empty() {
            return Err(unsupported("character class matches nothing printable"));
        }
        Ok(members)
    }
}

fn generate(node: &Node, rng: &mut impl Rng, out: &mut String) {
    match node {
        Node::Literal(c) => out.push(*c),
        Node::Set(chars) => {
            if let Some(c) = chars.choose(rng) {
                out.push(*c);
            }
        }
        Node::Alternation(branches) => {
            if let Some(branch) = branches.choose(rng) {
                for node in branch {
                    generate(node, rng, out);
                }
            }
        }
        Node::Repeat { node, min, max } => {
            let count = rng.random_range(*min..=*max);
            for _ in 0..count {
                generate(node, rng, out);
            }
        }
    }
}

/// Generates a random string matching `pattern`.
///
/// ```rust
/// use dbmasker_core::maskers::regexify;
///
/// let code = regexify(r"[A-F]{2}-\d{3}").unwrap();
/// assert_eq!(code.len(), 6);
/// ```
///
/// # Errors
/// Returns a masking error for invalid patterns and for constructs outside
/// the supported subset.
pub fn regexify(pattern: &str) -> Result<String> {
    regex::Regex::new(pattern)
        .map_err(|e| unsupported(format!("invalid pattern '{}': {}", pattern, e)))?;

    let mut parser = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
    };
    let branches = parser.parse_alternation()?;
    if parser.pos < parser.chars.len() {
        return Err(unsupported(format!("unbalanced ')' in '{}'", pattern)));
    }

    let mut out = String::new();
    generate(&Node::Alternation(branches), &mut rand::rng(), &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matches(pattern: &str) {
        let re = regex::Regex::new(&format!("^(?:{})$", pattern)).unwrap();
        for _ in 0..50 {
            let value = regexify(pattern).unwrap();
            assert!(re.is_match(&value), "'{}' does not match {}", value, pattern);
        }
    }

    #[test]
    fn test_generated_values_match() {
        for pattern in [
            r"[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,4}",
            r"\d{3}-\d{3}-\d{4}",
            r"(foo|bar)baz",
            r"[^a-z]{5}",
            r"ab?c*d+",
            r"x{2,}y{0,3}",
            r"(?:[a-f0-9]{2}:){5}[a-f0-9]{2}",
            r"\w+\s\w+",
            r"a.b",
            r"[\d\-]{4}",
        ] {
            assert_matches(pattern);
        }
    }

    #[test]
    fn test_anchors_are_dropped() {
        let value = regexify(r"^\d{4}$").unwrap();
        assert_eq!(value.len(), 4);
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_unbounded_repetition_is_capped() {
        for _ in 0..50 {
            let value = regexify("a*").unwrap();
            assert!(value.len() <= UNBOUNDED_EXTRA);
        }
    }

    #[test]
    fn test_invalid_patterns_are_errors() {
        assert!(regexify("[a-").is_err());
        assert!(regexify("(unclosed").is_err());
        assert!(regexify(r"\p{Greek}").is_err());
        assert!(regexify("(?i)abc").is_err());
    }

    #[test]
    fn test_literal_brace_without_bounds() {
        let value = regexify(r"a\{b").unwrap();
        assert_eq!(value, "a{b");
    }
}
