//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format callables, name lists, type names,
//! and helpful suggestions in error and report output.

/// Renders a receiver and a method as a callable.
///
/// # Examples
/// ```
/// use masnaa_support::rendering::render_callable;
///
/// assert_eq!(render_callable("app::Mailer", "create"), "app::Mailer::create");
/// assert_eq!(render_callable("@mailer.factory", "__invoke"), "@mailer.factory::__invoke");
/// ```
pub fn render_callable(receiver: &str, method: &str) -> String {
    format!("{receiver}::{method}")
}

/// Renders a list of names as a quoted, comma separated string.
///
/// # Examples
/// ```
/// use masnaa_support::rendering::render_list;
///
/// let names = vec!["class", "service"];
/// assert_eq!(render_list(&names), "\"class\", \"service\"");
/// ```
pub fn render_list(items: &[impl AsRef<str>]) -> String {
    items
        .iter()
        .map(|s| format!("\"{}\"", s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shortens a fully qualified type name for display.
///
/// Both `::` and `\` are treated as path separators.
///
/// ```
/// use masnaa_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("App\\Factory\\Mailer");
/// assert_eq!(short, "Mailer");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut start = 0;

    for (at, delimiter) in full_name.match_indices(['<', '>', ',', ' ']) {
        result.push_str(last_segment(&full_name[start..at]));
        result.push_str(delimiter);
        start = at + delimiter.len();
    }

    result.push_str(last_segment(&full_name[start..]));
    result
}

fn last_segment(path: &str) -> &str {
    path.rsplit(['\\', ':']).next().unwrap_or(path)
}

/// Suggests method names close to a misspelled one.
///
/// Matching ignores case. An exact match ranks first, then names that
/// start with the request (or that the request starts with), then names
/// containing it, then names sharing a prefix of at least three
/// characters. Ties go to the name closest in length, then alphabetical.
///
/// ```
/// use masnaa_support::rendering::suggest_similar;
///
/// let methods = ["createFromEnv", "create", "reset"];
/// assert_eq!(suggest_similar("creat", &methods, 3), vec!["create", "createFromEnv"]);
/// ```
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let score = similarity(&requested, &name.to_lowercase())?;
            Some((name, score))
        })
        .collect();

    scored.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .cmp(a_score)
            .then_with(|| a.len().abs_diff(requested.len()).cmp(&b.len().abs_diff(requested.len())))
            .then_with(|| a.cmp(b))
    });

    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn similarity(requested: &str, name: &str) -> Option<usize> {
    if name == requested {
        return Some(120);
    }
    if name.starts_with(requested) || requested.starts_with(name) {
        return Some(100);
    }
    if name.contains(requested) || requested.contains(name) {
        return Some(80);
    }

    let common = name
        .chars()
        .zip(requested.chars())
        .take_while(|(a, b)| a == b)
        .count();
    (common >= 3).then_some(40 + common)
}
