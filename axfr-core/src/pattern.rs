//! Domain patterns for first-appearance lookups.
//!
//! A query without `*` is an exact domain name. A query containing `*` is a
//! wildcard pattern where each `*` matches any run of characters, so
//! `exam*` matches every domain starting with `exam` and `*bank*` every
//! domain containing `bank`.

use std::fmt;

/// Wildcard marker accepted in first-appearance queries.
pub const WILDCARD: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainPattern {
    Exact(String),
    Wildcard(String),
}

impl DomainPattern {
    pub fn parse(query: &str) -> Self {
        if query.contains(WILDCARD) {
            DomainPattern::Wildcard(query.to_string())
        } else {
            DomainPattern::Exact(query.to_string())
        }
    }

    /// The query exactly as the client sent it.
    pub fn as_str(&self) -> &str {
        match self {
            DomainPattern::Exact(s) | DomainPattern::Wildcard(s) => s,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, DomainPattern::Wildcard(_))
    }

    /// SQL `LIKE` pattern with `\` as the escape character.
    ///
    /// Literal `%`, `_` and `\` are escaped; `*` becomes `%`.
    pub fn to_like_pattern(&self) -> String {
        let raw = self.as_str();
        let mut out = String::with_capacity(raw.len() + 4);
        for c in raw.chars() {
            match c {
                '%' | '_' | '\\' => {
                    out.push('\\');
                    out.push(c);
                }
                WILDCARD if self.is_wildcard() => out.push('%'),
                _ => out.push(c),
            }
        }
        out
    }

    /// Case-sensitive match against a domain name.
    pub fn matches(&self, domain: &str) -> bool {
        match self {
            DomainPattern::Exact(name) => name == domain,
            DomainPattern::Wildcard(pattern) => glob_match(pattern, domain),
        }
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let mut segments = pattern.split(WILDCARD);
    let first = segments.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };
    for segment in middle {
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selects_variant() {
        assert_eq!(
            DomainPattern::parse("example.se"),
            DomainPattern::Exact("example.se".to_string())
        );
        assert!(DomainPattern::parse("exam*").is_wildcard());
    }

    #[test]
    fn test_like_pattern_escapes_literals() {
        assert_eq!(DomainPattern::parse("exam*").to_like_pattern(), "exam%");
        assert_eq!(
            DomainPattern::parse("*my_site%*").to_like_pattern(),
            "%my\\_site\\%%"
        );
        assert_eq!(
            DomainPattern::parse("a_b.se").to_like_pattern(),
            "a\\_b.se"
        );
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let pattern = DomainPattern::parse("example.se");
        assert!(pattern.matches("example.se"));
        assert!(!pattern.matches("Example.se"));
        assert!(!pattern.matches("example.se.nu"));
    }

    #[test]
    fn test_wildcard_matching() {
        let prefix = DomainPattern::parse("exam*");
        assert!(prefix.matches("exam.se"));
        assert!(prefix.matches("example.se"));
        assert!(!prefix.matches("anexam.se"));

        let infix = DomainPattern::parse("*bank*");
        assert!(infix.matches("bank.se"));
        assert!(infix.matches("mybanking.se"));
        assert!(!infix.matches("bonk.se"));

        let suffix = DomainPattern::parse("*.nu");
        assert!(suffix.matches("a.nu"));
        assert!(!suffix.matches("a.se"));

        let both = DomainPattern::parse("a*a");
        assert!(both.matches("aa"));
        assert!(!both.matches("a"));
    }
}
