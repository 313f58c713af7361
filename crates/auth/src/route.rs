//! Tokenized route patterns.
//!
//! A pattern such as `/staff/orders/:orderId` is split on `/` into literal and
//! placeholder segments. A concrete path matches when it has the same number
//! of segments, every literal segment is equal, and every placeholder segment
//! is made of ASCII digits only.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PolicyError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    /// Numeric wildcard; the name is kept for captures and display only.
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        if !raw.starts_with('/') {
            return Err(PolicyError::InvalidPattern {
                pattern: raw.to_string(),
                reason: "must start with '/'".to_string(),
            });
        }

        let segments = split(raw)
            .map(|segment| match segment.strip_prefix(':') {
                Some("") => Err(PolicyError::InvalidPattern {
                    pattern: raw.to_string(),
                    reason: "placeholder without a name".to_string(),
                }),
                Some(name) => Ok(Segment::Id(name.to_string())),
                None => Ok(Segment::Literal(segment.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_parameterized(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Id(_)))
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Id(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if !self.is_parameterized() {
            return self.raw == path;
        }
        self.captures(path).is_some()
    }

    /// Placeholder values of `path`, or `None` when it does not match.
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        if !path.starts_with('/') {
            return None;
        }

        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(expected) if expected == part => {}
                Segment::Literal(_) => return None,
                Segment::Id(name) => {
                    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    captured.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(captured)
    }
}

/// Segments after the leading `/`. The root path has a single empty segment,
/// which keeps `/` from matching anything but itself.
fn split(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for RoutePattern {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RoutePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for RoutePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
