//! Component version parsing, comparison, and range matching.
//!
//! Versions are dotted strings with an optional pre-release part, such as
//! `1.2.0`, `2.0-dev` or `1.5a1.2504`:
//! - Segments are split on `.`, `-`, `_`, `+` and between digits and letters
//! - Numeric segments compare as numbers
//! - Pre-release words have a fixed ordering:
//!   `dev` < `alpha` < `beta` < `rc` < any other word < any number
//! - Release words (`final`, `stable`, ...) are ignored, so `1.0-final` equals `1.0`
//! - Missing trailing segments compare as zero, so `1.0` equals `1.0.0`,
//!   and rank above words, so `1.0-rc1` is below `1.0`

use std::cmp::Ordering;
use std::fmt;

/// A parsed component version with comparable segments.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    segments: Vec<Segment>,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Variant order is the ranking: qualifiers < words < numbers.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
enum Segment {
    Qualifier(QualifierKind),
    Text(String),
    Numeric(u64),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Dev,
    Alpha,
    Beta,
    Rc,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let original = version.trim().to_string();
        let segments = parse_segments(&original);
        Self { original, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Whether any segment is a pre-release word (`dev`, `alpha`, `beta`, `rc`).
    pub fn is_prerelease(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Qualifier(_)))
    }

    /// Compare only the first `len` segments of both versions.
    fn cmp_prefix(&self, other: &Self, len: usize) -> Ordering {
        for i in 0..len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        self.cmp_prefix(other, max_len)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (Some(s), None) => versus_missing(s),
        (None, Some(s)) => versus_missing(s).reverse(),
    }
}

/// A missing segment stands for `0`.
fn versus_missing(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(n) => n.cmp(&0),
        Segment::Qualifier(_) | Segment::Text(_) => Ordering::Less,
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in version.chars() {
        if matches!(ch, '.' | '-' | '_' | '+') {
            if !current.is_empty() {
                segments.extend(classify(&current));
                current.clear();
            }
            continue;
        }
        // `5a1` splits into `5`, `a`, `1`
        let boundary = current
            .chars()
            .last()
            .is_some_and(|prev| prev.is_ascii_digit() != ch.is_ascii_digit());
        if boundary {
            segments.extend(classify(&current));
            current.clear();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        segments.extend(classify(&current));
    }

    segments
}

/// `None` for release words, which carry no ordering.
fn classify(token: &str) -> Option<Segment> {
    if let Ok(n) = token.parse::<u64>() {
        return Some(Segment::Numeric(n));
    }
    let lower = token.to_lowercase();
    let kind = match lower.as_str() {
        "dev" | "snapshot" => QualifierKind::Dev,
        "alpha" | "a" => QualifierKind::Alpha,
        "beta" | "b" => QualifierKind::Beta,
        "rc" | "pre" => QualifierKind::Rc,
        "ga" | "final" | "release" | "stable" => return None,
        _ => return Some(Segment::Text(lower)),
    };
    Some(Segment::Qualifier(kind))
}

/// A version range expression.
///
/// Supports `*`, exact versions (`1.2`), wildcard segments (`1.2.*`), bounds
/// (`1.0 - 2.0.*`), operators (`>=1.0`, `<2`, `!=1.3`), `~1.2`, `^1.2.3`,
/// conjunctions (`>=1.0, <2.0`) and alternatives (`1.* || 3.*`).
///
/// Parsing never fails: text that is not an operator expression is taken as
/// an exact version.
#[derive(Debug, Clone)]
pub struct VersionRange {
    original: String,
    /// Alternatives joined by `||`; every constraint of one alternative must hold.
    alternatives: Vec<Vec<Constraint>>,
}

#[derive(Debug, Clone)]
enum Constraint {
    Any,
    Compare(Op, Pattern),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A version to compare against, truncated to `prefix` segments when it
/// ended in wildcards.
#[derive(Debug, Clone)]
struct Pattern {
    version: Version,
    prefix: Option<usize>,
}

impl Pattern {
    /// `None` for a pattern that matches everything (`*`).
    fn parse(text: &str) -> Option<Self> {
        let mut s = text.trim();
        let mut wildcard = false;
        while let Some(stripped) = s.strip_suffix('*') {
            wildcard = true;
            s = stripped.trim_end_matches('.');
        }
        if s.is_empty() {
            return None;
        }
        let version = Version::parse(s);
        let prefix = wildcard.then_some(version.segments.len());
        Some(Self { version, prefix })
    }

    fn order(&self, candidate: &Version) -> Ordering {
        match self.prefix {
            Some(len) => candidate.cmp_prefix(&self.version, len),
            None => candidate.cmp(&self.version),
        }
    }
}

impl Constraint {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Compare(op, pattern) => {
                let ord = pattern.order(version);
                match op {
                    Op::Eq => ord == Ordering::Equal,
                    Op::Ne => ord != Ordering::Equal,
                    Op::Gt => ord == Ordering::Greater,
                    Op::Ge => ord != Ordering::Less,
                    Op::Lt => ord == Ordering::Less,
                    Op::Le => ord != Ordering::Greater,
                }
            }
        }
    }
}

const OPERATORS: [&str; 9] = [">=", "<=", "!=", "==", ">", "<", "=", "~", "^"];

impl VersionRange {
    /// The range that matches every version, including an absent one.
    pub fn any() -> Self {
        Self {
            original: "*".to_string(),
            alternatives: vec![vec![Constraint::Any]],
        }
    }

    pub fn parse(text: &str) -> Self {
        let original = text.trim().to_string();
        let mut alternatives: Vec<Vec<Constraint>> = original
            .split('|')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(parse_alternative)
            .collect();
        if alternatives.is_empty() {
            alternatives.push(vec![Constraint::Any]);
        }
        Self {
            original,
            alternatives,
        }
    }

    pub fn as_str(&self) -> &str {
        if self.original.is_empty() {
            "*"
        } else {
            &self.original
        }
    }

    /// Whether this range accepts any version at all, including an absent one.
    pub fn is_any(&self) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt.iter().all(|c| matches!(c, Constraint::Any)))
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt.iter().all(|c| c.matches(version)))
    }

    /// Like [`contains`](Self::contains), but an absent version only matches `*`.
    pub fn matches(&self, version: Option<&Version>) -> bool {
        match version {
            Some(v) => self.contains(v),
            None => self.is_any(),
        }
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for VersionRange {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

fn parse_alternative(alt: &str) -> Vec<Constraint> {
    // Glue bare operators to their operand: `>= 1.0` -> `>=1.0`
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for raw in alt
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if let Some(op) = OPERATORS.iter().copied().find(|op| *op == raw) {
            pending_op = Some(op);
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{op}{raw}")),
            None => tokens.push(raw.to_string()),
        }
    }

    let mut constraints = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let hyphen = tokens.get(i + 1).is_some_and(|t| t == "-");
        if let (true, Some(upper)) = (hyphen, tokens.get(i + 2)) {
            constraints.extend(constraint(Op::Ge, &tokens[i]));
            constraints.extend(constraint(Op::Le, upper));
            i += 3;
            continue;
        }
        constraints.extend(parse_constraint(&tokens[i]));
        i += 1;
    }

    if constraints.is_empty() {
        constraints.push(Constraint::Any);
    }
    constraints
}

fn parse_constraint(token: &str) -> Vec<Constraint> {
    let Some(op) = OPERATORS.iter().copied().find(|op| token.starts_with(*op)) else {
        return constraint(Op::Eq, token);
    };
    let operand = &token[op.len()..];
    match op {
        ">=" => constraint(Op::Ge, operand),
        "<=" => constraint(Op::Le, operand),
        "!=" => constraint(Op::Ne, operand),
        ">" => constraint(Op::Gt, operand),
        "<" => constraint(Op::Lt, operand),
        "~" => tilde(operand),
        "^" => caret(operand),
        _ => constraint(Op::Eq, operand),
    }
}

fn constraint(op: Op, operand: &str) -> Vec<Constraint> {
    match Pattern::parse(operand) {
        Some(pattern) => vec![Constraint::Compare(op, pattern)],
        None => vec![Constraint::Any],
    }
}

/// `~1.2` is `>=1.2` within `1.*`; `~1.2.3` is `>=1.2.3` within `1.2.*`.
fn tilde(operand: &str) -> Vec<Constraint> {
    let Some(lower) = Pattern::parse(operand) else {
        return vec![Constraint::Any];
    };
    let len = lower.version.segments.len().saturating_sub(1).max(1);
    bounded(lower, len)
}

/// `^1.2.3` is `>=1.2.3` within `1.*`; `^0.2.3` is `>=0.2.3` within `0.2.*`.
fn caret(operand: &str) -> Vec<Constraint> {
    let Some(lower) = Pattern::parse(operand) else {
        return vec![Constraint::Any];
    };
    let segments = &lower.version.segments;
    let len = if segments.len() > 1 && segments[0] == Segment::Numeric(0) {
        2
    } else {
        1
    };
    bounded(lower, len)
}

fn bounded(lower: Pattern, prefix: usize) -> Vec<Constraint> {
    let same_series = Pattern {
        version: lower.version.clone(),
        prefix: Some(prefix),
    };
    vec![
        Constraint::Compare(Op::Ge, lower),
        Constraint::Compare(Op::Eq, same_series),
    ]
}

/// Total order over version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

/// Whether `version` satisfies `range`; an absent version only satisfies `*`.
pub fn satisfies(version: Option<&str>, range: &str) -> bool {
    let version = version.map(Version::parse);
    VersionRange::parse(range).matches(version.as_ref())
}
