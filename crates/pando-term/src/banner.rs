//! Startup banner printed once on stdout before the hub starts routing.

use crate::theme::Theme;

/// Box the application name:
///
/// ```text
/// ╭─────────╮
/// │  Pando  │
/// ╰─────────╯
/// ```
pub fn render(name: &str, theme: &Theme, color: bool) -> String {
    let name = name.trim();
    let width = name.chars().count() + 4;
    let rule = "─".repeat(width);
    let banner = format!("╭{rule}╮\n│  {name}  │\n╰{rule}╯");
    if color {
        banner
            .lines()
            .map(|line| theme.banner.apply(line).to_string())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        banner
    }
}
