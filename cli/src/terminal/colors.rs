use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 90, g: 170, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 210, g: 210, b: 210 };
pub const SUCCESS: Color = Color::Green;
pub const FAILURE: Color = Color::Red;
pub const SKIPPED: Color = Color::Yellow;
