use ratatui::style::Color;

pub const GREEN: Color = Color::Rgb(166, 227, 161);
pub const RED: Color = Color::Rgb(243, 139, 168);
pub const YELLOW: Color = Color::Rgb(249, 226, 175);
pub const GRAY: Color = Color::Rgb(147, 153, 178);

pub const CYAN: Color = Color::Rgb(148, 226, 213);
pub const TEXT: Color = Color::Rgb(205, 214, 244);
pub const SURFACE: Color = Color::Rgb(49, 50, 68);
pub const OVERLAY: Color = Color::Rgb(108, 112, 134);
