//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print completed action (bold green)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().green().bold());
}

/// Print completed action followed by an underlined value, e.g. an SSH key
pub fn success_with(msg: &(impl std::fmt::Display + ?Sized), value: &str) {
    println!("{} {}", msg.to_string().green().bold(), value.underline());
}

/// Print a no-op or empty result (bold yellow)
pub fn notice(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().yellow().bold());
}

/// Print a no-op result followed by an underlined value
pub fn notice_with(msg: &(impl std::fmt::Display + ?Sized), value: &str) {
    println!("{} {}", msg.to_string().yellow().bold(), value.underline());
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print `label: value` indented
pub fn field(label: &str, value: &(impl std::fmt::Display + ?Sized)) {
    println!("  {:<15} {}", format!("{label}:").dimmed(), value);
}

/// Print plain output (no color, for data such as keys or JSON)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}
