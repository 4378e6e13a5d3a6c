//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format injection chains, type names,
//! callable descriptions and "did you mean?" suggestions.

/// Maximum length of a callable description embedded in an error message.
pub const MAX_CALLABLE_LEN: usize = 250;

/// Renders an injection chain as a readable string.
///
/// # Examples
/// ```
/// use haqn_support::rendering::render_chain;
///
/// let chain = vec!["app::Mailer", "app::Transport", "app::Mailer"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "app::Mailer → app::Transport → app::Mailer");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// Both `::` and `\` are treated as path separators, so names written in
/// either convention shorten the same way.
///
/// ```
/// use haqn_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::UserService"), "UserService");
/// assert_eq!(shorten_type_name("App\\Http\\Kernel"), "Kernel");
/// assert_eq!(shorten_type_name("Arc<dyn my_app::Logger>"), "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '\\' => current_segment.clear(),
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Cuts a callable description down to [`MAX_CALLABLE_LEN`] characters.
///
/// Keeps accidental long strings from filling logs.
pub fn truncate_callable(description: &str) -> &str {
    match description.char_indices().nth(MAX_CALLABLE_LEN) {
        Some((cut, _)) => &description[..cut],
        None => description,
    }
}

/// Generates a "did you mean?" suggestion based on known type names.
///
/// Compares the requested type name against available types
/// and suggests close matches, best first.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower == requested_lower {
                return None;
            }

            if name_lower.contains(&requested_lower)
                || requested_lower.contains(&name_lower)
            {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short)
                || requested_short.contains(&name_short)
            {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
