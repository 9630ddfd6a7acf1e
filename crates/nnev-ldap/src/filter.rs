//! Search filters.
//!
//! A [`Filter`] renders to RFC 4515 text for the wire and can also be evaluated locally, which is
//! how the in-memory directory answers searches.

use crate::entry::LdapEntry;
use std::fmt;

/// LDAP search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// All sub-filters must match.
    And(Vec<Filter>),
    /// At least one sub-filter must match.
    Or(Vec<Filter>),
    /// Negation.
    Not(Box<Filter>),
    /// `attribute=value`, compared case-insensitively.
    Equality {
        /// Attribute name.
        attribute: String,
        /// Assertion value (unescaped).
        value: String,
    },
    /// `attribute=*`.
    Present(String),
}

impl Filter {
    /// Equality assertion.
    #[must_use]
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Presence assertion.
    #[must_use]
    pub fn present(attribute: impl Into<String>) -> Self {
        Self::Present(attribute.into())
    }

    /// Conjunction of the given filters.
    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Disjunction of the given filters.
    #[must_use]
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Evaluates the filter against an entry.
    #[must_use]
    pub fn matches(&self, entry: &LdapEntry) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Self::Not(filter) => !filter.matches(entry),
            Self::Equality { attribute, value } => entry
                .values(attribute)
                .is_some_and(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value))),
            Self::Present(attribute) => entry.values(attribute).is_some(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Not(filter) => write!(f, "(!{filter})"),
            Self::Equality { attribute, value } => {
                write!(f, "({attribute}={})", escape_filter_value(value))
            }
            Self::Present(attribute) => write!(f, "({attribute}=*)"),
        }
    }
}

fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> LdapEntry {
        LdapEntry::new("uid=user1,ou=users,dc=noname-ev,dc=de")
            .with_attribute("objectClass", ["top", "account", "posixAccount"])
            .with_attribute("uid", ["user1"])
    }

    #[test]
    fn renders_nested_filters() {
        let filter = Filter::and([
            Filter::equality("objectClass", "account"),
            Filter::or([Filter::equality("uid", "user1"), Filter::present("cn")]),
            Filter::Not(Box::new(Filter::equality("uid", "root"))),
        ]);
        assert_eq!(
            filter.to_string(),
            "(&(objectClass=account)(|(uid=user1)(cn=*))(!(uid=root)))"
        );
    }

    #[test]
    fn escapes_assertion_values() {
        let filter = Filter::equality("cn", "a*(b)\\");
        assert_eq!(filter.to_string(), "(cn=a\\2a\\28b\\29\\5c)");
    }

    #[test]
    fn evaluates_against_entries() {
        let entry = account();
        assert!(Filter::equality("uid", "USER1").matches(&entry));
        assert!(Filter::equality("objectclass", "posixaccount").matches(&entry));
        assert!(!Filter::equality("uid", "user2").matches(&entry));
        assert!(Filter::present("uid").matches(&entry));
        assert!(!Filter::present("sshPublicKey").matches(&entry));
        assert!(Filter::and([
            Filter::equality("objectClass", "account"),
            Filter::Not(Box::new(Filter::present("cn"))),
        ])
        .matches(&entry));
        assert!(!Filter::or(Vec::new()).matches(&entry));
        assert!(Filter::and(Vec::new()).matches(&entry));
    }
}
