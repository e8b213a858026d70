//! Text rendering utilities for human-friendly error messages.
//!
//! Token labels come in two shapes: fully qualified Rust type names
//! (`my_app::db::Database`) and quoted string names (`"IBar"`).
//! The helpers here shorten, join and compare both.

use std::fmt::Display;

/// Renders a resolution chain as a single line.
///
/// # Examples
/// ```
/// use wirebox_support::rendering::render_chain;
///
/// let chain = ["UserService", "UserRepo", "\"IDatabase\"", "UserService"];
/// assert_eq!(render_chain(&chain), "UserService → UserRepo → \"IDatabase\" → UserService");
/// ```
pub fn render_chain<T: Display>(chain: &[T]) -> String {
    chain
        .iter()
        .map(|label| shorten_type_name(&label.to_string()))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// Quoted string tokens are returned untouched.
///
/// ```
/// use wirebox_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::user::UserService"), "UserService");
/// assert_eq!(shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"), "Arc<dyn Logger>");
/// assert_eq!(shorten_type_name("\"app::config\""), "\"app::config\"");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    if full_name.starts_with('"') {
        return full_name.to_string();
    }

    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Picks registered labels that look like the requested one.
///
/// Scoring favours substring matches, then matches on the shortened
/// name, then a shared prefix of at least three characters.
pub fn suggest_similar(requested: &str, available: &[String], max_suggestions: usize) -> Vec<String> {
    if max_suggestions == 0 {
        return Vec::new();
    }

    let requested_full = normalize(requested);
    let requested_short = normalize(&shorten_type_name(requested));

    let mut scored: Vec<(&String, usize)> = available
        .iter()
        .filter(|name| name.as_str() != requested)
        .filter_map(|name| {
            let full = normalize(name);
            let short = normalize(&shorten_type_name(name));

            if full.is_empty() || requested_full.is_empty() {
                return None;
            }

            if full.contains(&requested_full) || requested_full.contains(&full) {
                return Some((name, 100));
            }

            if short.contains(&requested_short) || requested_short.contains(&short) {
                return Some((name, 80));
            }

            let common = short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.clone())
        .collect()
}

fn normalize(label: &str) -> String {
    label.trim_matches('"').to_lowercase()
}
