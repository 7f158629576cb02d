//! Module version literals.
//!
//! Grammar: one or more dot-separated numbers, then optionally a pre-release
//! tag (`ci`, `dev`, `qc`, `alpha`, `beta`, `rc`, any case) introduced by `.`
//! or `-` and followed by an optional number, then optionally `+build`.
//! Examples: `1`, `1.2.3`, `1.0-beta2`, `2.1.rc`, `1.0+20230724`.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

/// Pre-release designator, oldest first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreRelease {
    Ci,
    Dev,
    Qc,
    Alpha,
    Beta,
    Rc,
}

impl PreRelease {
    pub const ALL: [PreRelease; 6] = [
        PreRelease::Ci,
        PreRelease::Dev,
        PreRelease::Qc,
        PreRelease::Alpha,
        PreRelease::Beta,
        PreRelease::Rc,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PreRelease::Ci => "ci",
            PreRelease::Dev => "dev",
            PreRelease::Qc => "qc",
            PreRelease::Alpha => "alpha",
            PreRelease::Beta => "beta",
            PreRelease::Rc => "rc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionError {
    Empty,
    /// Unexpected character at a byte offset of the literal.
    Unexpected { at: usize, found: char },
    UnknownTag(String),
    /// A number does not fit in 32 bits.
    Overflow(String),
    /// Literal ends right after a separator.
    DanglingSeparator,
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::Empty => write!(f, "version must start with a number"),
            VersionError::Unexpected { at, found } => {
                write!(f, "unexpected {found:?} at position {at}")
            }
            VersionError::UnknownTag(tag) => write!(f, "unknown pre-release tag {tag:?}"),
            VersionError::Overflow(digits) => write!(f, "version number {digits} is too large"),
            VersionError::DanglingSeparator => write!(f, "version ends with a separator"),
        }
    }
}

impl std::error::Error for VersionError {}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version {
    literal: String,
    parts: SmallVec<[u32; 4]>,
    pre: Option<(PreRelease, Option<u32>)>,
    build: Option<String>,
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn number(&mut self) -> Result<Option<u32>, VersionError> {
        let rest = &self.text[self.pos..];
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return Ok(None);
        }
        let digits = &rest[..len];
        let n = digits
            .parse()
            .map_err(|_| VersionError::Overflow(digits.to_owned()))?;
        self.pos += len;
        Ok(Some(n))
    }

    fn tag(&mut self) -> Result<PreRelease, VersionError> {
        let rest = &self.text[self.pos..];
        let found = PreRelease::ALL.into_iter().find(|tag| {
            let name = tag.as_str();
            rest.get(..name.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(name))
        });
        match found {
            Some(tag) => {
                self.pos += tag.as_str().len();
                Ok(tag)
            }
            None => {
                let word: String = rest.chars().take_while(char::is_ascii_alphabetic).collect();
                Err(VersionError::UnknownTag(word))
            }
        }
    }

    fn unexpected(&self) -> VersionError {
        match self.peek() {
            Some(found) => VersionError::Unexpected {
                at: self.pos,
                found,
            },
            None => VersionError::DanglingSeparator,
        }
    }
}

impl Version {
    pub fn parse(text: &str) -> Result<Version, VersionError> {
        let mut s = Scanner { text, pos: 0 };
        let mut parts = SmallVec::new();

        loop {
            let Some(n) = s.number()? else {
                return Err(if parts.is_empty() {
                    VersionError::Empty
                } else {
                    s.unexpected()
                });
            };
            parts.push(n);
            match s.peek() {
                Some('.') => {
                    s.pos += 1;
                    if !s.peek().is_some_and(|c| c.is_ascii_digit()) {
                        break;
                    }
                }
                Some('-') => {
                    s.pos += 1;
                    break;
                }
                _ => break,
            }
        }

        let mut pre = None;
        if s.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            let tag = s.tag()?;
            pre = Some((tag, s.number()?));
        } else if s.pos > 0 && matches!(&text[s.pos - 1..s.pos], "." | "-") {
            return Err(s.unexpected());
        }

        let mut build = None;
        match s.peek() {
            None => {}
            Some('+') => build = Some(text[s.pos + 1..].to_owned()),
            Some(_) => return Err(s.unexpected()),
        }

        Ok(Version {
            literal: text.to_owned(),
            parts,
            pre,
            build,
        })
    }

    /// The numeric release segments.
    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    pub fn pre_release(&self) -> Option<(PreRelease, Option<u32>)> {
        self.pre
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// Generally available: no pre-release tag.
    pub fn is_release(&self) -> bool {
        self.pre.is_none()
    }

    /// Same version, ignoring trailing zero segments and build metadata
    /// (`1.2` is `1.2.0.0`).
    pub fn is_same_as(&self, that: &Version) -> bool {
        if self == that {
            return true;
        }
        let shared = self.parts.len().min(that.parts.len());
        self.parts[..shared] == that.parts[..shared]
            && self.parts[shared..].iter().all(|&p| p == 0)
            && that.parts[shared..].iter().all(|&p| p == 0)
            && self.pre == that.pre
    }

    /// Whether this version may stand in where `that` was requested.
    ///
    /// Every shared segment but the last must match exactly; the last
    /// shared segment may be newer only if this version is at least as
    /// specific. So `1.2`, `1.2.1` and `1.3` substitute for `1.2`, `2.0` does
    /// not, and `1.3` does not substitute for `1.2.0`. A release substitutes
    /// for a pre-release of the same number, never the other way around.
    pub fn is_substitutable_for(&self, that: &Version) -> bool {
        if self == that {
            return true;
        }

        let (this_ga, that_ga) = (self.parts.len(), that.parts.len());
        let shared = this_ga.min(that_ga);
        if shared > 0 {
            let last = shared - 1;
            if self.parts[..last] != that.parts[..last] {
                return false;
            }
            match self.parts[last].cmp(&that.parts[last]) {
                Ordering::Less => return false,
                Ordering::Greater => return this_ga >= that_ga,
                Ordering::Equal => {}
            }
        }

        match this_ga.cmp(&that_ga) {
            Ordering::Greater if self.parts[that_ga..].iter().any(|&p| p > 0) => return true,
            Ordering::Less if that.parts[this_ga..].iter().any(|&p| p > 0) => return false,
            _ => {}
        }

        match (self.pre, that.pre) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some((this_tag, this_n)), Some((that_tag, that_n))) => {
                match this_tag.cmp(&that_tag) {
                    Ordering::Less => false,
                    Ordering::Greater => true,
                    Ordering::Equal => match (this_n, that_n) {
                        (Some(a), Some(b)) => a >= b,
                        (None, Some(_)) => false,
                        (_, None) => true,
                    },
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
