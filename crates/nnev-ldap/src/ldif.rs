//! Reading and writing LDIF content records (RFC 2849).
//!
//! Only content records are supported. Change records and `:<` URL values are rejected.

use crate::entry::LdapEntry;
use crate::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use nnev_core::Error;

const LINE_WIDTH: usize = 76;

/// Parses every record in `input`.
///
/// # Errors
///
/// Returns [`Error::ParseError`] with the offending line number for malformed records.
pub fn parse(input: &str) -> Result<Vec<LdapEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<LdapEntry> = None;
    let mut first_record = true;

    for (line_no, line) in unfold(input) {
        if line.is_empty() {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let (name, value) = split_line(line_no, &line)?;
        if let Some(entry) = current.as_mut() {
            if name.eq_ignore_ascii_case("changetype") {
                return Err(parse_error(line_no, "change records are not supported"));
            }
            entry.add_value(&name, value);
        } else if first_record && name.eq_ignore_ascii_case("version") {
            if value != "1" {
                return Err(parse_error(line_no, format!("unsupported version `{value}`")));
            }
        } else if name.eq_ignore_ascii_case("dn") {
            current = Some(LdapEntry::new(value));
        } else {
            return Err(parse_error(line_no, "record does not start with `dn:`"));
        }
        first_record = false;
    }

    if let Some(entry) = current {
        entries.push(entry);
    }
    Ok(entries)
}

/// Renders entries as LDIF, one record per entry, separated by blank lines.
#[must_use]
pub fn write(entries: &[LdapEntry]) -> String {
    let mut out = String::from("version: 1\n");
    for entry in entries {
        out.push('\n');
        write_entry(&mut out, entry);
    }
    out
}

/// Appends a single record to `out`.
pub fn write_entry(out: &mut String, entry: &LdapEntry) {
    push_line(out, "dn", &entry.dn);
    for attribute in &entry.attributes {
        for value in &attribute.values {
            push_line(out, &attribute.name, value);
        }
    }
}

fn push_line(out: &mut String, name: &str, value: &str) {
    let line = if is_safe(value) {
        format!("{name}: {value}")
    } else {
        format!("{name}:: {}", STANDARD.encode(value))
    };

    // Values are ASCII here but attribute names need not be; never split inside a char.
    let mut rest = line.as_str();
    let mut width = LINE_WIDTH;
    while rest.len() > width {
        let mut at = width;
        while !rest.is_char_boundary(at) {
            at -= 1;
        }
        let (head, tail) = rest.split_at(at);
        out.push_str(head);
        out.push_str("\n ");
        rest = tail;
        width = LINE_WIDTH - 1;
    }
    out.push_str(rest);
    out.push('\n');
}

fn is_safe(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.first() {
        None => true,
        Some(b' ' | b':' | b'<') => false,
        Some(_) => {
            bytes.last() != Some(&b' ')
                && bytes
                    .iter()
                    .all(|&b| b.is_ascii() && b != b'\0' && b != b'\n' && b != b'\r')
        }
    }
}

/// Joins continuation lines and yields `(first line number, logical line)`.
fn unfold(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(continuation) = raw.strip_prefix(' ') {
            if let Some((_, last)) = lines.last_mut() {
                if !last.is_empty() {
                    last.push_str(continuation);
                    continue;
                }
            }
        }
        lines.push((idx + 1, raw.to_string()));
    }
    lines
}

fn split_line(line_no: usize, line: &str) -> Result<(String, String)> {
    let (name, rest) = line
        .split_once(':')
        .ok_or_else(|| parse_error(line_no, "missing `:` separator"))?;
    if name.is_empty() {
        return Err(parse_error(line_no, "empty attribute name"));
    }

    let value = if let Some(encoded) = rest.strip_prefix(':') {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| parse_error(line_no, format!("invalid base64 value: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|_| parse_error(line_no, "base64 value is not valid UTF-8"))?
    } else if rest.starts_with('<') {
        return Err(parse_error(line_no, "URL values are not supported"));
    } else {
        rest.trim_start_matches(' ').to_string()
    };

    Ok((name.to_string(), value))
}

fn parse_error(line_no: usize, message: impl std::fmt::Display) -> Error {
    Error::ParseError(format!("LDIF line {line_no}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_with_folding_and_base64() {
        let input = "\
version: 1
# exported accounts

dn: uid=user1,ou=users,dc=noname-ev,dc=de
objectClass: account
objectClass: posixAccount
uid: user1
sshPublicKey: ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAI
 Fold user1@host
cn:: SsO8cmdlbg==

dn: cn=group1,ou=groups,dc=noname-ev,dc=de
cn: group1
";
        let entries = parse(input).unwrap();
        assert_eq!(entries.len(), 2);

        let user = &entries[0];
        assert_eq!(user.dn, "uid=user1,ou=users,dc=noname-ev,dc=de");
        assert_eq!(user.values("objectClass").map(<[String]>::len), Some(2));
        assert_eq!(
            user.first("sshPublicKey"),
            Some("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFold user1@host")
        );
        assert_eq!(user.first("cn"), Some("Jürgen"));
        assert_eq!(entries[1].first("cn"), Some("group1"));
    }

    #[test]
    fn rejects_records_without_dn() {
        let err = parse("cn: orphan\n").unwrap_err();
        assert_eq!(
            err,
            Error::ParseError("LDIF line 1: record does not start with `dn:`".to_string())
        );
    }

    #[test]
    fn rejects_change_records() {
        let err = parse("dn: cn=x,dc=de\nchangetype: delete\n").unwrap_err();
        assert!(matches!(err, Error::ParseError(msg) if msg.starts_with("LDIF line 2")));
    }

    #[test]
    fn writer_encodes_unsafe_values_and_folds() {
        let long_key = format!("ssh-rsa {} user@host", "A".repeat(120));
        let entry = LdapEntry::new("uid=user1,ou=users,dc=noname-ev,dc=de")
            .with_attribute("cn", ["Jürgen"])
            .with_attribute("description", [" leading space"])
            .with_attribute("sshPublicKey", [long_key.as_str()]);

        let text = write(std::slice::from_ref(&entry));
        assert!(text.starts_with("version: 1\n\ndn: uid=user1"));
        assert!(text.contains("cn:: SsO8cmdlbg==\n"));
        assert!(text.contains("description:: "));
        assert!(text.lines().all(|line| line.len() <= LINE_WIDTH));

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, vec![entry]);
    }

    #[test]
    fn folding_never_splits_a_multibyte_attribute_name() {
        // The two-byte `ä` occupies bytes 75 and 76 of the line.
        let name = format!("{}ä", "x".repeat(75));
        let entry = LdapEntry::new("cn=group1,ou=groups,dc=noname-ev,dc=de")
            .with_attribute(&name, ["value"]);

        let text = write(std::slice::from_ref(&entry));
        assert!(text.lines().all(|line| line.len() <= LINE_WIDTH));
        assert!(text.contains(&format!("{}\n ä: value\n", "x".repeat(75))));

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed[0].first(&name), Some("value"));
    }
}
