//! Distribution-packaging version ordering
//!
//! Versions are compared component by component after splitting on
//! separators and digit/letter boundaries:
//!
//! - `2:1.0` — epoch, compared before anything else
//! - `1.0-r3` — revision, compared after everything else
//! - `1.0alpha1`, `1.0rc2` — pre-release words rank below `1.0`
//! - `1.0patch1`, `1.0post1` — post-release words rank above `1.0`
//! - `1.0a` — a letter glued to a number ranks above `1.0.x`
//!
//! Shorter versions are padded with zero components, so `1.0 == 1.0.0`.

use std::cmp::Ordering;

use serde::Serialize;

/// Words that mark a release made after the version they follow
const POST_RELEASE_KEYWORDS: &[&str] = &["post", "patch", "pl", "errata", "p"];

/// Result of comparing one version against another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionComparison {
    Older,
    Equal,
    Newer,
    /// At least one side could not be parsed
    Unknown,
}

impl VersionComparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionComparison::Older => "older",
            VersionComparison::Equal => "equal",
            VersionComparison::Newer => "newer",
            VersionComparison::Unknown => "unknown",
        }
    }

    /// The comparison seen from the other side
    pub fn reverse(self) -> Self {
        match self {
            VersionComparison::Older => VersionComparison::Newer,
            VersionComparison::Newer => VersionComparison::Older,
            other => other,
        }
    }
}

impl From<Ordering> for VersionComparison {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => VersionComparison::Older,
            Ordering::Equal => VersionComparison::Equal,
            Ordering::Greater => VersionComparison::Newer,
        }
    }
}

impl std::fmt::Display for VersionComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    PreRelease(char),
    Zero,
    PostRelease(char),
    /// Decimal digits without leading zeros, never empty
    Number(String),
    LetterSuffix(char),
}

impl Component {
    fn rank(&self) -> u8 {
        match self {
            Component::PreRelease(_) => 0,
            Component::Zero => 1,
            Component::PostRelease(_) => 2,
            Component::Number(_) => 3,
            Component::LetterSuffix(_) => 4,
        }
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Component::PreRelease(a), Component::PreRelease(b))
            | (Component::PostRelease(a), Component::PostRelease(b))
            | (Component::LetterSuffix(a), Component::LetterSuffix(b)) => a.cmp(b),
            (Component::Number(a), Component::Number(b)) => compare_digits(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A version string split into comparable parts
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    epoch: String,
    components: Vec<Component>,
    revision: String,
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParsedVersion {}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_digits(&self.epoch, &other.epoch)
            .then_with(|| compare_components(&self.components, &other.components))
            .then_with(|| compare_digits(&self.revision, &other.revision))
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse a version string, returning None for malformed input.
///
/// Malformed means empty, containing whitespace or non-ASCII characters,
/// having a non-numeric epoch, or carrying no digit at all (e.g. `rolling`).
pub fn parse_version(version: &str) -> Option<ParsedVersion> {
    if version.is_empty() || !version.chars().all(|c| c.is_ascii_graphic()) {
        return None;
    }

    let (epoch, rest) = match version.split_once(':') {
        Some((epoch, rest)) => {
            if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (normalize_digits(epoch), rest)
        }
        None => ("0".to_string(), version),
    };

    let (upstream, revision) = split_revision(rest);

    let upstream = match upstream.strip_prefix(['v', 'V']) {
        Some(stripped) if stripped.starts_with(|c: char| c.is_ascii_digit()) => stripped,
        _ => upstream,
    };

    if !upstream.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(ParsedVersion {
        epoch,
        components: tokenize(upstream),
        revision,
    })
}

/// Compare `a` relative to `b`
pub fn compare(a: &str, b: &str) -> VersionComparison {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b).into(),
        _ => VersionComparison::Unknown,
    }
}

/// Pick the greatest parseable version, ignoring malformed entries
pub fn max_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(|v| parse_version(v).map(|parsed| (v, parsed)))
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(v, _)| v)
}

fn split_revision(version: &str) -> (&str, String) {
    if let Some(idx) = version.rfind("-r") {
        let digits = &version[idx + 2..];
        if idx > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return (&version[..idx], normalize_digits(digits));
        }
    }
    (version, "0".to_string())
}

fn tokenize(version: &str) -> Vec<Component> {
    let bytes = version.as_bytes();
    let mut components = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        if bytes[i].is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let digits = normalize_digits(&version[start..i]);
            components.push(if digits == "0" {
                Component::Zero
            } else {
                Component::Number(digits)
            });
        } else if bytes[i].is_ascii_alphabetic() {
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word = version[start..i].to_ascii_lowercase();
            let first = word.chars().next().unwrap_or('a');
            let glued_to_number = start > 0 && bytes[start - 1].is_ascii_digit();
            let followed_by_digit = i < bytes.len() && bytes[i].is_ascii_digit();

            let component = if word.len() == 1 && glued_to_number && !followed_by_digit {
                Component::LetterSuffix(first)
            } else if POST_RELEASE_KEYWORDS.contains(&word.as_str()) {
                Component::PostRelease(first)
            } else {
                Component::PreRelease(first)
            };
            components.push(component);
        } else {
            i += 1;
        }
    }

    components
}

fn compare_components(a: &[Component], b: &[Component]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).unwrap_or(&Component::Zero);
        let right = b.get(i).unwrap_or(&Component::Zero);
        match left.cmp(right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn normalize_digits(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Compare two normalized digit strings numerically without overflow
fn compare_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
