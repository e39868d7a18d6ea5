use std::fmt;
use std::str::FromStr;

use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const fn hex(rgb: u32) -> Self {
        Color((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Mixes `self` towards black by `amount` (0.0 keeps the colour).
    pub fn darken(self, amount: f32) -> Self {
        let scale = |c: u8| (c as f32 * (1.0 - amount)).round() as u8;
        Color(scale(self.0), scale(self.1), scale(self.2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    Blue,
    Sepia,
    Contrast,
}

/// Colours used to draw the weekly grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub grid: Color,
    pub border: Color,
    /// Labels inside boxes, axis ticks and the legend.
    pub text: Color,
    pub title: Color,
    pub rooms: [Color; 9],
    pub fill_alpha: f32,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Light,
        Theme::Dark,
        Theme::Blue,
        Theme::Sepia,
        Theme::Contrast,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Blue => "blue",
            Theme::Sepia => "sepia",
            Theme::Contrast => "contrast",
        }
    }

    /// Shown after "Weekly Timetable - " in the image heading.
    pub fn title(self) -> &'static str {
        match self {
            Theme::Light => "Light Mode",
            Theme::Dark => "Dark Mode",
            Theme::Blue => "Blue Theme",
            Theme::Sepia => "Sepia Theme",
            Theme::Contrast => "High Contrast",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Color::hex(0xFFFFFF),
                grid: Color::hex(0xCCCCCC),
                border: Color::hex(0x333333),
                text: Color::hex(0x000000),
                title: Color::hex(0x333333),
                rooms: [
                    Color::hex(0x8DD3C7),
                    Color::hex(0xFFFFB3),
                    Color::hex(0xBEBADA),
                    Color::hex(0xFB8072),
                    Color::hex(0x80B1D3),
                    Color::hex(0xFDB462),
                    Color::hex(0xB3DE69),
                    Color::hex(0xFCCDE5),
                    Color::hex(0xD9D9D9),
                ],
                fill_alpha: 0.7,
            },
            Theme::Dark => Palette {
                background: Color::hex(0x2E2E2E),
                grid: Color::hex(0x555555),
                border: Color::hex(0x888888),
                text: Color::hex(0xFFFFFF),
                title: Color::hex(0xFFFFFF),
                rooms: [
                    Color::hex(0x5DA5DA),
                    Color::hex(0xFAA43A),
                    Color::hex(0x60BD68),
                    Color::hex(0xF17CB0),
                    Color::hex(0xB2912F),
                    Color::hex(0xB276B2),
                    Color::hex(0xDECF3F),
                    Color::hex(0xF15854),
                    Color::hex(0x4D4D4D),
                ],
                fill_alpha: 0.8,
            },
            Theme::Blue => Palette {
                background: Color::hex(0xEBF5FB),
                grid: Color::hex(0xA9CCE3),
                border: Color::hex(0x2874A6),
                text: Color::hex(0x1A5276),
                title: Color::hex(0x1A5276),
                rooms: [
                    Color::hex(0xAED6F1),
                    Color::hex(0x85C1E9),
                    Color::hex(0x3498DB),
                    Color::hex(0x2E86C1),
                    Color::hex(0x2874A6),
                    Color::hex(0x21618C),
                    Color::hex(0x1B4F72),
                    Color::hex(0x7FB3D5),
                    Color::hex(0x5499C7),
                ],
                fill_alpha: 0.75,
            },
            Theme::Sepia => Palette {
                background: Color::hex(0xF5EFDC),
                grid: Color::hex(0xD5B895),
                border: Color::hex(0xA1887F),
                text: Color::hex(0x6D4C41),
                title: Color::hex(0x5D4037),
                rooms: [
                    Color::hex(0xE1C4A7),
                    Color::hex(0xD4A478),
                    Color::hex(0xC78F65),
                    Color::hex(0xBA7A52),
                    Color::hex(0xA66746),
                    Color::hex(0x8D5B3F),
                    Color::hex(0x754C37),
                    Color::hex(0x5E3B2E),
                    Color::hex(0x6D4C31),
                ],
                fill_alpha: 0.75,
            },
            Theme::Contrast => Palette {
                background: Color::hex(0x000000),
                grid: Color::hex(0xFFFFFF),
                border: Color::hex(0xFFFFFF),
                text: Color::hex(0xFFFFFF),
                title: Color::hex(0xFFFFFF),
                rooms: [
                    Color::hex(0xFF0000),
                    Color::hex(0x00FF00),
                    Color::hex(0x0000FF),
                    Color::hex(0xFFFF00),
                    Color::hex(0xFF00FF),
                    Color::hex(0x00FFFF),
                    Color::hex(0xFFFFFF),
                    Color::hex(0xFFA500),
                    Color::hex(0x32CD32),
                ],
                fill_alpha: 0.9,
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.name() == s)
            .ok_or_else(|| ScrapeError::new(format!("Unknown theme: {}", s)))
    }
}
