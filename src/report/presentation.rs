//! Output medium detection.
//!
//! An output stream whose terminal geometry can be queried gets rounded
//! borders, alternating row backgrounds, bold emphasis and rows clipped to
//! the terminal width. Anything else (files, pipes) gets a plain ASCII table.

use serde::Deserialize;
use tabled::settings::Color;

const BOLD: &str = "\u{1b}[1m";
/// Ends bold without resetting the background of the surrounding row.
const NORMAL_INTENSITY: &str = "\u{1b}[22m";

/// Emphasis applied to identifiers and fixed versions inside cells.
pub trait Emphasis {
    fn emphasize(&self, text: &str) -> String;
}

pub struct Plain;

impl Emphasis for Plain {
    fn emphasize(&self, text: &str) -> String {
        text.to_string()
    }
}

pub struct Bold;

impl Emphasis for Bold {
    fn emphasize(&self, text: &str) -> String {
        format!("{}{}{}", BOLD, text, NORMAL_INTENSITY)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Style only when the output is a terminal
    #[default]
    Auto,
    /// Always style the output
    Always,
    /// Never style the output
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// `+`, `-` and `|` borders, no colors.
    Ascii,
    /// Rounded box drawing borders with alternating row backgrounds.
    Rounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub interactive: bool,
    pub max_width: Option<usize>,
}

impl Presentation {
    pub fn plain() -> Self {
        Self {
            interactive: false,
            max_width: None,
        }
    }

    /// A zero width means the width is unknown.
    pub fn interactive(max_width: Option<usize>) -> Self {
        Self {
            interactive: true,
            max_width: max_width.filter(|&w| w > 0),
        }
    }

    /// Derive the presentation from a terminal width query result.
    pub fn from_terminal_width(width: Option<u16>) -> Self {
        match width {
            Some(w) => Self::interactive(Some(usize::from(w))),
            None => Self::plain(),
        }
    }

    /// Query the terminal geometry of `stream`.
    #[cfg(unix)]
    pub fn detect<S: std::os::fd::AsFd>(stream: &S) -> Self {
        Self::from_terminal_width(query_width(terminal_size::terminal_size_of(stream)))
    }

    /// Query the terminal geometry of `stream`.
    #[cfg(windows)]
    pub fn detect<S: std::os::windows::io::AsHandle>(stream: &S) -> Self {
        Self::from_terminal_width(query_width(terminal_size::terminal_size_of(stream)))
    }

    /// Apply a color choice on top of a detected presentation.
    pub fn with_color(self, choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Auto => self,
            ColorChoice::Always => Self::interactive(self.max_width),
            ColorChoice::Never => Self::plain(),
        }
    }

    /// Cap the row width, keeping the narrower of both limits. A zero cap is ignored.
    pub fn with_max_width(mut self, cap: Option<usize>) -> Self {
        self.max_width = match (self.max_width, cap.filter(|&c| c > 0)) {
            (Some(w), Some(c)) => Some(w.min(c)),
            (w, c) => w.or(c),
        };
        self
    }

    pub fn emphasis(&self) -> &'static dyn Emphasis {
        if self.interactive {
            &Bold
        } else {
            &Plain
        }
    }

    pub fn table_style(&self) -> TableStyle {
        if self.interactive {
            TableStyle::Rounded
        } else {
            TableStyle::Ascii
        }
    }

    /// Backgrounds of odd and even data rows.
    pub fn row_colors(&self) -> Option<[Color; 2]> {
        if !self.interactive {
            return None;
        }
        Some([Color::BG_BRIGHT_BLACK, Color::BG_BLACK])
    }
}

fn query_width(
    size: Option<(terminal_size::Width, terminal_size::Height)>,
) -> Option<u16> {
    match size {
        Some((terminal_size::Width(w), _)) => Some(w),
        None => {
            log::debug!("Output is not a terminal, using plain table style");
            None
        }
    }
}
