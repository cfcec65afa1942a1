//! Capability tokens, shared between protocol v1 (a flat set on the first
//! advertised/requested ref line) and v2 (a keyed list terminated by a flush).

use indexmap::IndexSet;
use std::collections::HashMap;

/// A capability token is either a bare identifier (`no-thin`) or `key=value`
/// (`agent=git/2.40`, `symref=HEAD:refs/heads/main`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Bare(String),
    KeyValue(String, String),
}

impl Token {
    pub fn parse(s: &str) -> Self {
        match s.split_once('=') {
            Some((k, v)) => Self::KeyValue(k.to_owned(), v.to_owned()),
            None => Self::Bare(s.to_owned()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Bare(k) => k,
            Self::KeyValue(k, _) => k,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Bare(_) => None,
            Self::KeyValue(_, v) => Some(v),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bare(k) => write!(f, "{}", k),
            Self::KeyValue(k, v) => write!(f, "{}={}", k, v),
        }
    }
}

/// Protocol v1 capability set: an unordered-looking, but order-of-first-appearance
/// preserving, collection of tokens (some servers are picky about the order a
/// client echoes tokens back in, and diagnostics read better in advertised order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    tokens: IndexSet<Token>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a space-separated capability string, e.g. the text following the
    /// NUL byte on the first advertised ref line.
    pub fn parse(s: &str) -> Self {
        Self { tokens: s.split_ascii_whitespace().map(Token::parse).collect() }
    }

    pub fn insert(&mut self, token: Token) -> &mut Self {
        self.tokens.insert(token);
        self
    }

    pub fn contains_bare(&self, key: &str) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Bare(k) if k == key))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens.iter().find_map(|t| match t {
            Token::KeyValue(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    /// Tokens whose key starts with `symref=`, expanded into `(name, target)` pairs.
    pub fn symrefs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            Token::KeyValue(k, v) if k == "symref" => v.split_once(':').map(|(a, b)| (a.to_owned(), b.to_owned())),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn to_request_string(&self) -> String {
        self.tokens.iter().map(Token::to_string).collect::<Vec<_>>().join(" ")
    }
}

impl FromIterator<Token> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        Self { tokens: iter.into_iter().collect() }
    }
}

/// Protocol v2 capability advertisement: `key` or `key=value` lines, one per
/// pkt-line, terminated by a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities2 {
    entries: HashMap<String, Option<String>>,
}

impl Capabilities2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_line(&mut self, line: &str) {
        match line.split_once('=') {
            Some((k, v)) => {
                self.entries.insert(k.to_owned(), Some(v.to_owned()));
            }
            None => {
                self.entries.insert(line.to_owned(), None);
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// The `fetch` capability's value is a space-separated subset list
    /// (`shallow`, `deepen-since`, `deepen-not`, `deepen-relative`, `filter`, ...).
    pub fn fetch_subcaps(&self) -> Vec<&str> {
        self.value("fetch").map(|v| v.split_ascii_whitespace().collect()).unwrap_or_default()
    }

    pub fn supports_fetch_subcap(&self, name: &str) -> bool {
        self.fetch_subcaps().contains(&name)
    }

    pub fn agent(&self) -> Option<&str> {
        self.value("agent")
    }
}
