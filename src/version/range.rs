//! Maven version ranges
//!
//! Supports the enforcer-rule range grammar
//! (<https://maven.apache.org/enforcer/enforcer-rules/versionRanges.html>):
//! - `[1.0,2.0]`, `[1.0,2.0)`, `(1.0,2.0]`, `(1.0,2.0)` - intervals
//! - `(,1.0]`, `(,1.0)`, `[1.0,)`, `(1.0,)` - edges, unbounded on one side
//! - `[1.0]` - a pinned version
//! - `1.0` - a recommended version (a hint, never a constraint)
//! - `,` - the free range
//!
//! Comma-separated constraints are a conjunction: a version is in the range only
//! if every constraint accepts it.

use std::fmt;
use std::str::FromStr;

use crate::version::error::VersionError;
use crate::version::maven_version::MavenVersion;

/// The range that accepts every version and recommends nothing.
/// Identity element of [`VersionRange::intersect`].
pub static FREE_RANGE: VersionRange = VersionRange {
    sets: Vec::new(),
    recommended: Vec::new(),
};

/// Boundary kinds of an [`VersionSet::Interval`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    /// `(a,b)`
    BothOpen,
    /// `[a,b]`
    Closed,
    /// `[a,b)`
    UpperOpen,
    /// `(a,b]`
    LowerOpen,
}

/// Directions of an [`VersionSet::Edge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// `(,v]`
    UpTo,
    /// `(,v)`
    Under,
    /// `[v,)`
    NotUnder,
    /// `(v,)`
    Above,
}

/// A single constraint of a [`VersionRange`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSet {
    Interval {
        lower: MavenVersion,
        upper: MavenVersion,
        kind: IntervalKind,
    },
    Edge {
        bound: MavenVersion,
        kind: EdgeKind,
    },
    Pinned(MavenVersion),
}

impl VersionSet {
    /// Checks whether the constraint accepts `version`.
    ///
    /// Expressed purely through [`MavenVersion::is_newer_than`].
    pub fn contains(&self, version: &MavenVersion) -> bool {
        match self {
            VersionSet::Interval { lower, upper, kind } => match kind {
                IntervalKind::Closed => {
                    !version.is_newer_than(upper) && !lower.is_newer_than(version)
                }
                IntervalKind::UpperOpen => {
                    upper.is_newer_than(version) && version.is_newer_than(lower)
                }
                IntervalKind::LowerOpen => {
                    !version.is_newer_than(upper) && version.is_newer_than(lower)
                }
                IntervalKind::BothOpen => {
                    version.is_newer_than(lower) && !upper.is_newer_than(version)
                }
            },
            VersionSet::Edge { bound, kind } => match kind {
                EdgeKind::UpTo => !version.is_newer_than(bound),
                EdgeKind::Under => bound.is_newer_than(version),
                EdgeKind::NotUnder => !bound.is_newer_than(version),
                EdgeKind::Above => version.is_newer_than(bound),
            },
            VersionSet::Pinned(pinned) => {
                !pinned.is_newer_than(version) && !version.is_newer_than(pinned)
            }
        }
    }
}

impl fmt::Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSet::Interval { lower, upper, kind } => {
                let (open, close) = match kind {
                    IntervalKind::Closed => ('[', ']'),
                    IntervalKind::UpperOpen => ('[', ')'),
                    IntervalKind::LowerOpen => ('(', ']'),
                    IntervalKind::BothOpen => ('(', ')'),
                };
                write!(f, "{open}{lower},{upper}{close}")
            }
            VersionSet::Edge { bound, kind } => match kind {
                EdgeKind::UpTo => write!(f, "(,{bound}]"),
                EdgeKind::Under => write!(f, "(,{bound})"),
                EdgeKind::NotUnder => write!(f, "[{bound},)"),
                EdgeKind::Above => write!(f, "({bound},)"),
            },
            VersionSet::Pinned(version) => write!(f, "[{version}]"),
        }
    }
}

/// A parsed version range: a conjunction of constraints plus recommended versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    sets: Vec<VersionSet>,
    recommended: Vec<MavenVersion>,
}

impl VersionRange {
    /// Returns the free range
    pub fn free() -> &'static VersionRange {
        &FREE_RANGE
    }

    /// Parses a range string
    pub fn parse(range: &str) -> Result<Self, VersionError> {
        if range == "," {
            return Ok(FREE_RANGE.clone());
        }

        let mut sets = Vec::new();
        let mut recommended = Vec::new();

        for token in split_top_level(range) {
            if token.starts_with('[') || token.starts_with('(') {
                sets.push(parse_set(token, range)?);
            } else {
                recommended.push(parse_bound(token, token, range)?);
            }
        }

        Ok(Self { sets, recommended })
    }

    /// The constraints, in parse order
    pub fn constraints(&self) -> &[VersionSet] {
        &self.sets
    }

    /// The recommended versions, in parse order
    pub fn recommended_versions(&self) -> &[MavenVersion] {
        &self.recommended
    }

    /// True if the range neither constrains nor recommends anything
    pub fn is_free(&self) -> bool {
        self.sets.is_empty() && self.recommended.is_empty()
    }

    /// Checks whether every constraint accepts `version`.
    /// Recommended versions play no part in this.
    pub fn contains_version(&self, version: &MavenVersion) -> bool {
        self.sets.iter().all(|set| set.contains(version))
    }

    /// Combines two ranges into one that only accepts versions both accept.
    /// Constraints and recommendations are concatenated, `self` first.
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        if self.is_free() {
            return other.clone();
        }
        if other.is_free() {
            return self.clone();
        }

        let sets = self.sets.iter().chain(&other.sets).cloned().collect();
        let recommended = self
            .recommended
            .iter()
            .chain(&other.recommended)
            .cloned()
            .collect();
        VersionRange { sets, recommended }
    }

    /// The newest recommended version that lies within the range.
    ///
    /// Among equally recent candidates the one listed first wins. Returns `None`
    /// if there are no recommendations or none of them is accepted.
    pub fn recommended(&self) -> Option<&MavenVersion> {
        self.recommended
            .iter()
            .filter(|version| self.contains_version(version))
            .fold(None, |newest: Option<&MavenVersion>, version| match newest {
                Some(current) if !version.is_newer_than(current) => Some(current),
                _ => Some(version),
            })
    }
}

/// Splits on commas that are not inside a bracket pair
fn split_top_level(range: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_brackets = false;
    let mut start = 0;

    for (i, c) in range.char_indices() {
        match c {
            '[' | '(' => in_brackets = true,
            ']' | ')' => in_brackets = false,
            ',' if !in_brackets => {
                tokens.push(&range[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    // A trailing comma does not produce an empty token
    if start != range.len() {
        tokens.push(&range[start..]);
    }

    tokens
}

fn malformed(token: &str, range: &str) -> VersionError {
    VersionError::MalformedRange {
        token: token.to_string(),
        range: range.to_string(),
    }
}

/// Parses one bound of a range token. Bounds may not contain further commas.
fn parse_bound(bound: &str, token: &str, range: &str) -> Result<MavenVersion, VersionError> {
    if bound.contains(',') {
        return Err(malformed(token, range));
    }
    MavenVersion::parse(bound).map_err(|_| malformed(token, range))
}

/// Parses a bracketed token into an interval, an edge or a pinned version
fn parse_set(token: &str, range: &str) -> Result<VersionSet, VersionError> {
    let bytes = token.as_bytes();
    let len = bytes.len();
    if len < 3 || !matches!(bytes[len - 1], b']' | b')') {
        return Err(malformed(token, range));
    }

    let closed_left = bytes[0] == b'[';
    let closed_right = bytes[len - 1] == b']';

    if bytes[1] == b',' {
        let bound = parse_bound(&token[2..len - 1], token, range)?;
        let kind = if closed_right {
            EdgeKind::UpTo
        } else {
            EdgeKind::Under
        };
        return Ok(VersionSet::Edge { bound, kind });
    }

    if bytes[len - 2] == b',' {
        let bound = parse_bound(&token[1..len - 2], token, range)?;
        let kind = if closed_left {
            EdgeKind::NotUnder
        } else {
            EdgeKind::Above
        };
        return Ok(VersionSet::Edge { bound, kind });
    }

    let inner = &token[1..len - 1];
    let Some((lower, upper)) = inner.split_once(',') else {
        if closed_left && closed_right {
            return Ok(VersionSet::Pinned(parse_bound(inner, token, range)?));
        }
        return Err(malformed(token, range));
    };

    let lower = parse_bound(lower, token, range)?;
    let upper = parse_bound(upper, token, range)?;
    let kind = match (closed_left, closed_right) {
        (true, true) => IntervalKind::Closed,
        (true, false) => IntervalKind::UpperOpen,
        (false, true) => IntervalKind::LowerOpen,
        (false, false) => IntervalKind::BothOpen,
    };
    Ok(VersionSet::Interval { lower, upper, kind })
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            return f.write_str(",");
        }

        let sets = self.sets.iter().map(ToString::to_string);
        let recommended = self.recommended.iter().map(ToString::to_string);
        let rendered: Vec<String> = sets.chain(recommended).collect();
        f.write_str(&rendered.join(","))
    }
}
