//! Version constraint parsing and evaluation
//!
//! Supported expressions:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `1.2`, `1.2.x`, `1.*` - wildcard: any version on that line
//! - `!=1.2.3` - anything but the given version (wildcards allowed)
//! - `>1.2.3`, `>=1.2.3`, `<1.2.3`, `<=1.2.3` (`=<` alias) - comparison operators;
//!   missing components compare as zero, except `<=1.2` which covers the 1.2 line
//! - `~1.2.3` / `~>1.2.3` - tilde: >=1.2.3 <1.3.0
//! - `^1.2.3` - caret: >=1.2.3 <2.0.0 (`^0.2.3` is >=0.2.3 <1.0.0)
//! - `1.2 - 1.4.5` - inclusive hyphen range
//! - `*`, `x` - any version
//!
//! Terms separated by commas or whitespace must all hold; `||` separates
//! alternatives of which at least one must hold.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};

use crate::version::error::ConstraintError;
use crate::version::semver::normalize_tag;

static HYPHEN_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)\s+-\s+(\S+)").unwrap());

static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!=|>=|<=|=<|~>|=|>|<|~|\^)?\s*([vV]?[0-9xX*][0-9A-Za-z.*+\-]*)").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Exact,
    NotEqual,
    Gt,
    Gte,
    Lt,
    Lte,
    Tilde,
    Caret,
}

impl Operator {
    fn parse(op: Option<&str>) -> Self {
        match op {
            Some("!=") => Operator::NotEqual,
            Some(">") => Operator::Gt,
            Some(">=") => Operator::Gte,
            Some("<") => Operator::Lt,
            Some("<=") | Some("=<") => Operator::Lte,
            Some("~") | Some("~>") => Operator::Tilde,
            Some("^") => Operator::Caret,
            _ => Operator::Exact,
        }
    }
}

/// A version with possibly missing or wildcard components
#[derive(Debug, Clone)]
struct PartialVersion {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl PartialVersion {
    fn parse(input: &str) -> Result<Self, String> {
        let input = normalize_tag(input);
        let split_at = input.find(['-', '+']).unwrap_or(input.len());
        let (core, suffix) = input.split_at(split_at);

        let (pre, build) = match suffix.strip_prefix('-') {
            Some(rest) => match rest.split_once('+') {
                Some((pre, build)) => (pre, build),
                None => (rest, ""),
            },
            None => ("", suffix.strip_prefix('+').unwrap_or("")),
        };
        let pre = Prerelease::new(pre).map_err(|e| format!("{input}: {e}"))?;
        BuildMetadata::new(build).map_err(|e| format!("{input}: {e}"))?;

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(format!("{input}: too many version components"));
        }

        let mut components = [None; 3];
        for (slot, part) in components.iter_mut().zip(parts) {
            match part {
                "x" | "X" | "*" => break,
                _ => {
                    let value = part
                        .parse::<u64>()
                        .map_err(|_| format!("{input}: invalid version component {part:?}"))?;
                    *slot = Some(value);
                }
            }
        }

        Ok(Self {
            major: components[0],
            minor: components[1],
            patch: components[2],
            pre,
        })
    }

    fn is_complete(&self) -> bool {
        self.patch.is_some()
    }

    /// Lowest version matched by this partial version
    fn floor(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }

    /// First version past the line named by a partial version ("1.2" -> 1.3.0)
    fn next_line(&self) -> Result<Option<Version>, String> {
        let next = match (self.major, self.minor, self.patch) {
            (Some(major), None, _) => Some(Version::new(bump(major)?, 0, 0)),
            (Some(major), Some(minor), None) => Some(Version::new(major, bump(minor)?, 0)),
            _ => None,
        };
        Ok(next)
    }
}

fn bump(component: u64) -> Result<u64, String> {
    component
        .checked_add(1)
        .ok_or_else(|| "version component out of range".to_string())
}

#[derive(Debug, Clone)]
struct Bound {
    version: Version,
    inclusive: bool,
}

impl Bound {
    fn inclusive(version: Version) -> Option<Self> {
        Some(Self {
            version,
            inclusive: true,
        })
    }

    fn exclusive(version: Version) -> Option<Self> {
        Some(Self {
            version,
            inclusive: false,
        })
    }
}

/// A single requirement a version must satisfy
#[derive(Debug, Clone)]
enum Requirement {
    Any,
    Exact(Version),
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    Not(Box<Requirement>),
}

impl Requirement {
    fn from_term(op: Operator, v: PartialVersion) -> Result<Self, String> {
        if v.major.is_none() {
            return match op {
                Operator::Exact | Operator::Gte | Operator::Lte => Ok(Requirement::Any),
                _ => Err("wildcard cannot be used with this operator".to_string()),
            };
        }

        let floor = v.floor();
        let requirement = match op {
            Operator::Exact => Self::exact_or_line(&v)?,
            Operator::NotEqual => Requirement::Not(Box::new(Self::exact_or_line(&v)?)),
            Operator::Gt => Self::range(Bound::exclusive(floor), None),
            Operator::Gte => Self::range(Bound::inclusive(floor), None),
            Operator::Lt => Self::range(None, Bound::exclusive(floor)),
            Operator::Lte => match v.next_line()? {
                Some(next) => Self::range(None, Bound::exclusive(next)),
                None => Self::range(None, Bound::inclusive(floor)),
            },
            // ~0.0.0 accepts everything
            Operator::Tilde if v.minor == Some(0) && v.patch == Some(0) && floor.major == 0 => {
                Self::range(Bound::inclusive(floor), None)
            }
            Operator::Tilde => {
                let upper = match v.minor {
                    Some(minor) => Version::new(floor.major, bump(minor)?, 0),
                    None => Version::new(bump(floor.major)?, 0, 0),
                };
                Self::range(Bound::inclusive(floor), Bound::exclusive(upper))
            }
            // Caret pins the major version only, 0.x included
            Operator::Caret => {
                let upper = Version::new(bump(floor.major)?, 0, 0);
                Self::range(Bound::inclusive(floor), Bound::exclusive(upper))
            }
        };
        Ok(requirement)
    }

    fn exact_or_line(v: &PartialVersion) -> Result<Self, String> {
        if v.is_complete() {
            return Ok(Requirement::Exact(v.floor()));
        }
        let upper = v.next_line()?.and_then(Bound::exclusive);
        Ok(Self::range(Bound::inclusive(v.floor()), upper))
    }

    fn range(lower: Option<Bound>, upper: Option<Bound>) -> Self {
        Requirement::Range { lower, upper }
    }

    fn satisfies(&self, version: &Version) -> bool {
        match self {
            Requirement::Any => true,
            Requirement::Exact(v) => precedence(version, v) == Ordering::Equal,
            Requirement::Range { lower, upper } => {
                let above = lower.as_ref().is_none_or(|b| match precedence(version, &b.version) {
                    Ordering::Greater => true,
                    Ordering::Equal => b.inclusive,
                    Ordering::Less => false,
                });
                let below = upper.as_ref().is_none_or(|b| match precedence(version, &b.version) {
                    Ordering::Less => true,
                    Ordering::Equal => b.inclusive,
                    Ordering::Greater => false,
                });
                above && below
            }
            Requirement::Not(inner) => !inner.satisfies(version),
        }
    }
}

/// Compare ignoring build metadata, which carries no precedence
fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// A parsed version constraint, keeping the expression it was parsed from
#[derive(Debug, Clone)]
pub struct Constraint {
    expression: String,
    /// Alternatives (OR) of requirement sets (AND)
    alternatives: Vec<Vec<Requirement>>,
}

impl Constraint {
    pub fn parse(expression: &str) -> Result<Self, ConstraintError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ConstraintError::invalid(expression, "empty constraint"));
        }

        let alternatives = trimmed
            .split("||")
            .map(|group| {
                Self::parse_group(group)
                    .map_err(|reason| ConstraintError::invalid(expression, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expression: expression.to_string(),
            alternatives,
        })
    }

    fn parse_group(group: &str) -> Result<Vec<Requirement>, String> {
        let group = HYPHEN_RANGE_RE.replace_all(group.trim(), ">=${1} <=${2}");
        let is_separator = |gap: &str| gap.chars().all(|c| c.is_whitespace() || c == ',');

        let mut requirements = Vec::new();
        let mut last_end = 0;
        for captures in TERM_RE.captures_iter(&group) {
            let Some(term) = captures.get(0) else {
                continue;
            };
            let gap = &group[last_end..term.start()];
            if !is_separator(gap) {
                return Err(format!("unexpected {:?}", gap.trim()));
            }
            last_end = term.end();

            let op = Operator::parse(captures.get(1).map(|m| m.as_str()));
            let version = PartialVersion::parse(&captures[2])?;
            requirements.push(Requirement::from_term(op, version)?);
        }

        let rest = &group[last_end..];
        if !is_separator(rest) {
            return Err(format!("unexpected {:?}", rest.trim()));
        }
        if requirements.is_empty() {
            return Err("no version requirement".to_string());
        }
        Ok(requirements)
    }

    /// Check whether a version satisfies the constraint
    pub fn check(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|requirements| requirements.iter().all(|r| r.satisfies(version)))
    }

    /// The expression as written in the configuration
    pub fn as_str(&self) -> &str {
        &self.expression
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
