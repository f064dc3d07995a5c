//! Maven version values
//!
//! Versions are compared the way Maven's `ComparableVersion` does it: the string
//! is split into items on `.` and `-` and on every digit/letter transition,
//! numbers compare numerically, well-known qualifiers compare by release
//! maturity, and trailing "null" items are dropped so `1`, `1.0` and `1-ga`
//! all denote the same version.
//!
//! The only primitive is [`MavenVersion::is_newer_than`]; equality and the
//! three-way ordering are both derived from it.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::version::error::VersionError;

/// Qualifiers in ascending order of maturity. The empty string is a release.
const QUALIFIERS: &[&str] = &["alpha", "beta", "milestone", "rc", "snapshot", "", "sp"];

/// Index of the release qualifier inside [`QUALIFIERS`]
const RELEASE_INDEX: usize = 5;

#[derive(Debug, Clone)]
enum Item {
    /// Decimal digits without leading zeros; "" is zero
    Int(String),
    /// Qualifier after alias expansion
    Str(String),
    List(Vec<Item>),
}

impl Item {
    fn int(digits: &str) -> Self {
        Item::Int(digits.trim_start_matches('0').to_string())
    }

    fn qualifier(value: &str, followed_by_digit: bool) -> Self {
        let value = match value {
            "a" if followed_by_digit => "alpha",
            "b" if followed_by_digit => "beta",
            "m" if followed_by_digit => "milestone",
            "ga" | "final" | "release" => "",
            "cr" => "rc",
            other => other,
        };
        Item::Str(value.to_string())
    }

    fn is_null(&self) -> bool {
        match self {
            Item::Int(digits) => digits.is_empty(),
            Item::Str(value) => value.is_empty(),
            Item::List(items) => items.is_empty(),
        }
    }

    /// Compare against another item, `None` standing in for a missing item
    fn compare(&self, other: Option<&Item>) -> Ordering {
        match (self, other) {
            (Item::Int(digits), None) => {
                if digits.is_empty() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            (Item::Int(a), Some(Item::Int(b))) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Item::Int(_), Some(_)) => Ordering::Greater,

            (Item::Str(value), None) => qualifier_key(value).cmp(&(RELEASE_INDEX, "")),
            (Item::Str(_), Some(Item::Int(_))) => Ordering::Less,
            (Item::Str(a), Some(Item::Str(b))) => qualifier_key(a).cmp(&qualifier_key(b)),
            (Item::Str(_), Some(Item::List(_))) => Ordering::Less,

            (Item::List(items), None) => items
                .iter()
                .map(|item| item.compare(None))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal),
            (Item::List(_), Some(Item::Int(_))) => Ordering::Less,
            (Item::List(_), Some(Item::Str(_))) => Ordering::Greater,
            (Item::List(left), Some(Item::List(right))) => compare_lists(left, right),
        }
    }
}

fn compare_lists(left: &[Item], right: &[Item]) -> Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(l), r) => l.compare(r),
            (None, Some(r)) => r.compare(None).reverse(),
            (None, None) => Ordering::Equal,
        };
        if ordering.is_ne() {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Sort key of a qualifier: known qualifiers by position, unknown ones after all
/// of them in lexical order.
fn qualifier_key(value: &str) -> (usize, &str) {
    match QUALIFIERS.iter().position(|q| *q == value) {
        Some(index) => (index, ""),
        None => (QUALIFIERS.len(), value),
    }
}

fn normalize(items: &mut Vec<Item>) {
    let mut i = items.len();
    while i > 0 {
        i -= 1;
        if items[i].is_null() {
            items.remove(i);
        } else if !matches!(items[i], Item::List(_)) {
            break;
        }
    }
}

fn parse_item(is_digit: bool, text: &str) -> Item {
    if is_digit {
        Item::int(text)
    } else {
        Item::qualifier(text, false)
    }
}

/// The innermost open list, falling back to the root list
fn current<'a>(root: &'a mut Vec<Item>, nested: &'a mut [Vec<Item>]) -> &'a mut Vec<Item> {
    match nested.last_mut() {
        Some(list) => list,
        None => root,
    }
}

/// Builds the item tree. Each `-` and each digit/letter transition opens a
/// nested list that extends to the end of the string.
fn parse_items(value: &str) -> Vec<Item> {
    let mut root = Vec::new();
    let mut nested: Vec<Vec<Item>> = Vec::new();
    let mut is_digit = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '.' | '-' => {
                let item = if i == start {
                    Item::int("")
                } else {
                    parse_item(is_digit, &value[start..i])
                };
                current(&mut root, &mut nested).push(item);
                start = i + 1;
                if c == '-' {
                    nested.push(Vec::new());
                }
            }
            c if c.is_ascii_digit() => {
                if !is_digit && i > start {
                    let item = Item::qualifier(&value[start..i], true);
                    current(&mut root, &mut nested).push(item);
                    start = i;
                    nested.push(Vec::new());
                }
                is_digit = true;
            }
            _ => {
                if is_digit && i > start {
                    let item = parse_item(true, &value[start..i]);
                    current(&mut root, &mut nested).push(item);
                    start = i;
                    nested.push(Vec::new());
                }
                is_digit = false;
            }
        }
    }

    if value.len() > start {
        let item = parse_item(is_digit, &value[start..]);
        current(&mut root, &mut nested).push(item);
    }

    // Fold nested lists back into their parents, normalising each on the way
    while let Some(mut list) = nested.pop() {
        normalize(&mut list);
        current(&mut root, &mut nested).push(Item::List(list));
    }
    normalize(&mut root);
    root
}

/// A parsed Maven version.
///
/// `Display` renders the string the version was parsed from, unchanged.
/// Equality is recency-based: `1.0 == 1.0.0` because neither is newer than the
/// other.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    original: String,
    items: Vec<Item>,
}

impl MavenVersion {
    /// Parses a version string. Only an empty (or all-whitespace) string is rejected.
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        if version.trim().is_empty() {
            return Err(VersionError::EmptyVersion);
        }
        Ok(Self {
            original: version.to_string(),
            items: parse_items(&version.to_lowercase()),
        })
    }

    /// Returns true if `self` denotes a strictly more recent version than `other`
    pub fn is_newer_than(&self, other: &MavenVersion) -> bool {
        compare_lists(&self.items, &other.items) == Ordering::Greater
    }

    /// The version string as originally given
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        !self.is_newer_than(other) && !other.is_newer_than(self)
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.is_newer_than(other) {
            Ordering::Greater
        } else if other.is_newer_than(self) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

impl FromStr for MavenVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
