//! Distinguished names (RFC 4514) for directory entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use nnev_core::error::Error as CoreError;

/// Reasons a distinguished name fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// Nothing to parse.
    #[error("empty distinguished name")]
    Empty,
    /// Two separators with nothing in between.
    #[error("empty RDN")]
    EmptyRdn,
    /// An RDN without `=`.
    #[error("RDN `{0}` has no `=`")]
    MissingEquals(String),
    /// Nothing before the `=`.
    #[error("RDN `{0}` has no attribute type")]
    MissingAttribute(String),
    /// Nothing after the `=`.
    #[error("attribute `{0}` has no value")]
    MissingValue(String),
    /// Input ends with a lone backslash.
    #[error("trailing backslash")]
    TrailingEscape,
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::ParseError(format!("invalid distinguished name: {err}"))
    }
}

/// One `attribute=value` assertion of an RDN. The value is stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    attribute: String,
    value: String,
}

impl RelativeDistinguishedName {
    /// Creates an assertion from an attribute type and a raw (unescaped) value.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute type, e.g. `uid`.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Unescaped value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn key(&self) -> String {
        format!(
            "{}={}",
            self.attribute.to_ascii_lowercase(),
            escape_value(&self.value.to_lowercase())
        )
    }
}

impl fmt::Display for RelativeDistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape_value(&self.value))
    }
}

/// A parsed distinguished name, leaf first.
///
/// Derived equality is exact. Directory servers compare attribute types and the values used
/// here case-insensitively, which [`DistinguishedName::same_entry`] mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistinguishedName {
    raw: String,
    rdns: Vec<Vec<RelativeDistinguishedName>>,
}

impl DistinguishedName {
    /// Parses the string form of a DN.
    ///
    /// Backslash escapes, including `\XX` hex pairs, are resolved. The stored string is
    /// re-rendered with minimal escaping.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError`] for empty input or malformed RDNs.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, DistinguishedNameError> {
        let input = input.as_ref().trim();
        if input.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }
        Ok(Self::from_rdns(scan(input)?))
    }

    /// Builds `attribute=value,<parent>`.
    #[must_use]
    pub fn child_of(
        attribute: impl Into<String>,
        value: impl Into<String>,
        parent: &DistinguishedName,
    ) -> Self {
        let mut rdns = Vec::with_capacity(parent.rdns.len() + 1);
        rdns.push(vec![RelativeDistinguishedName::new(attribute, value)]);
        rdns.extend(parent.rdns.iter().cloned());
        Self::from_rdns(rdns)
    }

    fn from_rdns(rdns: Vec<Vec<RelativeDistinguishedName>>) -> Self {
        let raw = rdns
            .iter()
            .map(|rdn| {
                rdn.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .collect::<Vec<_>>()
            .join(",");
        Self { raw, rdns }
    }

    /// String form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of RDNs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    /// Never true for a parsed name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// All assertions, leaf first.
    pub fn components(&self) -> impl Iterator<Item = &RelativeDistinguishedName> + '_ {
        self.rdns.iter().flatten()
    }

    /// The DN one level up, or `None` for a single-RDN name.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.rdns.len() > 1).then(|| Self::from_rdns(self.rdns[1..].to_vec()))
    }

    /// Lowercased form with multi-valued RDNs sorted, usable as a lookup key.
    #[must_use]
    pub fn normalized(&self) -> String {
        Self::key_of(&self.rdns)
    }

    fn key_of(rdns: &[Vec<RelativeDistinguishedName>]) -> String {
        rdns.iter()
            .map(|rdn| {
                let mut keys = rdn.iter().map(RelativeDistinguishedName::key).collect::<Vec<_>>();
                keys.sort_unstable();
                keys.join("+")
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True if both names denote the same entry.
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }

    /// True if `self` is `base` or lies anywhere below it.
    #[must_use]
    pub fn is_within(&self, base: &Self) -> bool {
        self.rdns.len() >= base.rdns.len()
            && Self::key_of(&self.rdns[self.rdns.len() - base.rdns.len()..]) == base.normalized()
    }

    /// True if `self` is exactly one level below `base`.
    #[must_use]
    pub fn is_child_of(&self, base: &Self) -> bool {
        self.rdns.len() == base.rdns.len() + 1 && self.is_within(base)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = DistinguishedNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DistinguishedName {
    type Error = DistinguishedNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DistinguishedName> for String {
    fn from(dn: DistinguishedName) -> Self {
        dn.raw
    }
}

/// Splits on unescaped `,` and `+`, pairing each token with the attribute before its first `=`.
fn scan(input: &str) -> Result<Vec<Vec<RelativeDistinguishedName>>, DistinguishedNameError> {
    let mut rdns = Vec::new();
    let mut rdn = Vec::new();
    let mut attribute: Option<String> = None;
    let mut token = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                token.push(ch);
                token.push(chars.next().ok_or(DistinguishedNameError::TrailingEscape)?);
            }
            '=' if attribute.is_none() => attribute = Some(std::mem::take(&mut token)),
            ',' | '+' => {
                rdn.push(assertion(attribute.take(), std::mem::take(&mut token))?);
                if ch == ',' {
                    rdns.push(std::mem::take(&mut rdn));
                }
            }
            _ => token.push(ch),
        }
    }
    rdn.push(assertion(attribute, token)?);
    rdns.push(rdn);
    Ok(rdns)
}

fn assertion(
    attribute: Option<String>,
    raw_value: String,
) -> Result<RelativeDistinguishedName, DistinguishedNameError> {
    let Some(attribute) = attribute else {
        let raw = raw_value.trim();
        return Err(if raw.is_empty() {
            DistinguishedNameError::EmptyRdn
        } else {
            DistinguishedNameError::MissingEquals(raw.to_string())
        });
    };

    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(DistinguishedNameError::MissingAttribute(
            raw_value.trim().to_string(),
        ));
    }
    let value = trim_value(&raw_value);
    if value.is_empty() {
        return Err(DistinguishedNameError::MissingValue(attribute.to_string()));
    }
    Ok(RelativeDistinguishedName::new(attribute, unescape(value)))
}

/// Trims surrounding spaces but keeps an escaped trailing space.
fn trim_value(raw: &str) -> &str {
    let raw = raw.trim_start();
    let trimmed = raw.trim_end();
    let backslashes = trimmed.chars().rev().take_while(|&c| c == '\\').count();
    if backslashes % 2 == 1 && trimmed.len() < raw.len() {
        &raw[..=trimmed.len()]
    } else {
        trimmed
    }
}

fn unescape(value: &str) -> String {
    let mut bytes = Vec::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('\\') {
        bytes.extend_from_slice(rest[..pos].as_bytes());
        let escaped = &rest[pos + 1..];
        let hex = escaped
            .get(..2)
            .filter(|pair| pair.chars().all(|c| c.is_ascii_hexdigit()))
            .and_then(|pair| u8::from_str_radix(pair, 16).ok());
        if let Some(byte) = hex {
            bytes.push(byte);
            rest = &escaped[2..];
        } else if let Some(ch) = escaped.chars().next() {
            let mut buf = [0; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            rest = &escaped[ch.len_utf8()..];
        } else {
            rest = escaped;
        }
    }
    bytes.extend_from_slice(rest.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        if matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (i == 0 && matches!(ch, ' ' | '#'))
            || (i == last && ch == ' ')
        {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
