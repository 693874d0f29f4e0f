//! Colour theme for pando's terminal output.
//!
//! Themes are defined as TOML files. The built-in themes are embedded via
//! [`include_str!`] so the hub works without any files on disk. Resolve the
//! configured theme once at startup with [`Theme::resolve`] and hand it to
//! the [`LineFormatter`](crate::LineFormatter).
//!
//! # Colour assignment for channels
//!
//! Channel labels are coloured by hashing the name of the subscription that
//! admitted them to a stable index into the palette, so every channel under
//! one subscription shares a colour regardless of arrival order.

use config::{Config, File, FileFormat};
use crossterm::style::{Attribute, Color, ContentStyle};
use pando_core::Severity;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_THEME_SRC: &str = include_str!("themes/default.toml");
const GRUVBOX_DARK_THEME_SRC: &str = include_str!("themes/gruvbox_dark.toml");

// ---------------------------------------------------------------------------
// Raw (serde) types: mirror the TOML structure
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawStyle {
    fg: Option<String>,
    bg: Option<String>,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    dim: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    underlined: bool,
}

impl RawStyle {
    fn into_style(self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = self.fg.as_deref().and_then(parse_color);
        style.background_color = self.bg.as_deref().and_then(parse_color);
        let flags = [
            (self.bold, Attribute::Bold),
            (self.dim, Attribute::Dim),
            (self.italic, Attribute::Italic),
            (self.underlined, Attribute::Underlined),
        ];
        for (enabled, attribute) in flags {
            if enabled {
                style.attributes.set(attribute);
            }
        }
        style
    }
}

#[derive(Debug, Deserialize)]
struct RawSeverities {
    emerg: RawStyle,
    alert: RawStyle,
    crit: RawStyle,
    error: RawStyle,
    warning: RawStyle,
    notice: RawStyle,
    info: RawStyle,
    debug: RawStyle,
}

#[derive(Debug, Deserialize)]
struct RawChannels {
    palette: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTheme {
    severities: RawSeverities,
    #[serde(default)]
    timestamp: RawStyle,
    #[serde(default)]
    banner: RawStyle,
    channels: RawChannels,
}

// ---------------------------------------------------------------------------
// Public Theme type
// ---------------------------------------------------------------------------

/// Terminal colour theme. All styles are pre-resolved crossterm
/// [`ContentStyle`] values.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Indexed by [`Severity::rank`].
    severities: [ContentStyle; 8],
    pub timestamp: ContentStyle,
    pub banner: ContentStyle,
    /// Ordered colour palette used for channel colour cycling.
    channel_palette: Vec<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::load_default()
    }
}

impl Theme {
    /// Load and parse the embedded default theme.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed.
    pub fn load_default() -> Self {
        Self::from_toml_str(DEFAULT_THEME_SRC).expect("embedded default theme must be valid TOML")
    }

    /// Load and parse the embedded Gruvbox Dark theme.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed.
    pub fn load_gruvbox_dark() -> Self {
        Self::from_toml_str(GRUVBOX_DARK_THEME_SRC)
            .expect("embedded gruvbox dark theme must be valid TOML")
    }

    /// A built-in theme by name (`default`, `gruvbox_dark`) or a path to a
    /// theme file.
    pub fn resolve(name: &str) -> anyhow::Result<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "default" => Ok(Self::load_default()),
            "gruvbox_dark" | "gruvbox" => Ok(Self::load_gruvbox_dark()),
            _ => Self::from_file(Path::new(name)),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read theme {}: {e}", path.display()))?;
        Self::from_toml_str(&src)
    }

    /// Parse a theme from a TOML string. Unknown keys are ignored.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        let raw: RawTheme = Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        let s = raw.severities;
        Ok(Self {
            severities: [
                s.emerg.into_style(),
                s.alert.into_style(),
                s.crit.into_style(),
                s.error.into_style(),
                s.warning.into_style(),
                s.notice.into_style(),
                s.info.into_style(),
                s.debug.into_style(),
            ],
            timestamp: raw.timestamp.into_style(),
            banner: raw.banner.into_style(),
            channel_palette: raw
                .channels
                .palette
                .iter()
                .filter_map(|s| parse_color(s))
                .collect(),
        })
    }

    /// Style for a severity name. The `none` sentinel is never printed, it
    /// gets the default style.
    pub fn severity_style(&self, severity: Severity) -> ContentStyle {
        self.severities
            .get(usize::from(severity.rank()))
            .copied()
            .unwrap_or_default()
    }

    /// Stable style for a channel or pattern name.
    pub fn channel_style(&self, name: &str) -> ContentStyle {
        let mut style = ContentStyle::new();
        if !self.channel_palette.is_empty() {
            let idx = stable_hash(name) % self.channel_palette.len();
            style.foreground_color = Some(self.channel_palette[idx]);
        }
        style
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// djb2-style hash, stable across Rust versions and process restarts.
fn stable_hash(s: &str) -> usize {
    s.bytes().fold(5381usize, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as usize)
    })
}

/// Parse a colour name into a crossterm [`Color`].
///
/// Accepts:
/// - Named terminal colours (case-insensitive): `red`, `light_red`, `dark_gray`, etc.
/// - Hex RGB: `#rrggbb`
/// - 256-colour indexed: `indexed:N`
fn parse_color(s: &str) -> Option<Color> {
    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::DarkRed),
        "green" => Some(Color::DarkGreen),
        "yellow" => Some(Color::DarkYellow),
        "blue" => Some(Color::DarkBlue),
        "magenta" => Some(Color::DarkMagenta),
        "cyan" => Some(Color::DarkCyan),
        "gray" | "grey" => Some(Color::Grey),
        "dark_gray" | "darkgray" | "dark_grey" | "darkgrey" => Some(Color::DarkGrey),
        "light_red" => Some(Color::Red),
        "light_green" => Some(Color::Green),
        "light_yellow" => Some(Color::Yellow),
        "light_blue" => Some(Color::Blue),
        "light_magenta" => Some(Color::Magenta),
        "light_cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        s if s.starts_with('#') && s.len() == 7 => {
            let r = u8::from_str_radix(&s[1..3], 16).ok()?;
            let g = u8::from_str_radix(&s[3..5], 16).ok()?;
            let b = u8::from_str_radix(&s[5..7], 16).ok()?;
            Some(Color::Rgb { r, g, b })
        }
        s if s.starts_with("indexed:") => {
            let n: u8 = s["indexed:".len()..].parse().ok()?;
            Some(Color::AnsiValue(n))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
