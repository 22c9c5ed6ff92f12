//! Hierarchical addresses for units and their members.
//!
//! A [`Uri`] is either a bare path (`/test/app`) or a link that prefixes the
//! path with a scheme and authority (`http://127.0.0.1:8702/test/app`). URIs
//! are immutable: [`Uri::append`] returns a new value one segment longer.
//! Equality and ordering follow the canonical string form, which is also the
//! JSON key of a compiled unit.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::UriError;

/// A single validated path segment.
///
/// Segments are non-empty, are not `.` or `..`, contain no `/` or
/// whitespace, and never start with `$`, which is reserved for parameter
/// references in method bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    /// Returns the segment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(segment: &str) -> Result<(), UriError> {
        let reason = if segment.is_empty() {
            "segment is empty"
        } else if segment == "." || segment == ".." {
            "dot segments are not addresses"
        } else if segment.starts_with('$') {
            "'$' is reserved for parameter references"
        } else if segment.contains('/') {
            "segment contains '/'"
        } else if segment.chars().any(char::is_whitespace) {
            "segment contains whitespace"
        } else if segment.contains(['?', '#']) {
            "segment contains a query or fragment delimiter"
        } else {
            return Ok(());
        };

        Err(UriError::InvalidSegment {
            segment: segment.to_owned(),
            reason,
        })
    }
}

impl FromStr for Id {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<&str> for Id {
    type Error = UriError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable, appendable address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    /// `scheme://authority`, present only for links.
    host: Option<String>,
    segments: Vec<Id>,
}

impl Uri {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            host: None,
            segments: Vec::new(),
        }
    }

    /// Returns a new URI with `segment` appended. `self` is unchanged.
    #[must_use]
    pub fn append(&self, segment: &Id) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment.clone());

        Self {
            host: self.host.clone(),
            segments,
        }
    }

    /// The `scheme://authority` prefix of a link, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[Id] {
        &self.segments
    }

    /// The final segment, or `None` for a root.
    #[must_use]
    pub fn last(&self) -> Option<&Id> {
        self.segments.last()
    }

    /// The path-only form of this URI (the host is dropped).
    #[must_use]
    pub fn path(&self) -> Self {
        Self {
            host: None,
            segments: self.segments.clone(),
        }
    }

    /// True if `prefix` has the same host and its segments lead this URI's segments.
    #[must_use]
    pub fn starts_with(&self, prefix: &Uri) -> bool {
        self.host == prefix.host && self.segments.starts_with(&prefix.segments)
    }

    fn parse_path(text: &str, path: &str) -> Result<Vec<Id>, UriError> {
        if path.is_empty() || path == "/" {
            return Ok(Vec::new());
        }

        let Some(rest) = path.strip_prefix('/') else {
            return Err(UriError::Malformed(text.to_owned()));
        };

        rest.split('/').map(Id::from_str).collect()
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((scheme, rest)) = s.split_once("://") {
            let scheme_ok = !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

            let (authority, path) = match rest.find('/') {
                Some(i) => rest.split_at(i),
                None => (rest, ""),
            };

            if !scheme_ok || authority.is_empty() || authority.contains(char::is_whitespace) {
                return Err(UriError::Malformed(s.to_owned()));
            }

            Ok(Self {
                host: Some(format!("{scheme}://{authority}")),
                segments: Self::parse_path(s, path)?,
            })
        } else if s.starts_with('/') {
            Ok(Self {
                host: None,
                segments: Self::parse_path(s, s)?,
            })
        } else {
            Err(UriError::Malformed(s.to_owned()))
        }
    }
}

impl TryFrom<&str> for Uri {
    type Error = UriError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            f.write_str(host)?;
        } else if self.segments.is_empty() {
            return f.write_str("/");
        }

        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }

        Ok(())
    }
}

impl PartialOrd for Uri {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uri {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
