use catppuccin::PALETTE;
use ratatui::style::Color;

const fn to_color(c: &catppuccin::Color) -> Color {
    Color::Rgb(c.rgb.r, c.rgb.g, c.rgb.b)
}

/// Application color theme.
///
/// Holds resolved colors directly so the rest of the UI is independent of the
/// palette crate. Use the flavor constructors or [`theme_from_name`].
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    base: Color,
    surface0: Color,
    overlay1: Color,
    subtext1: Color,
    text: Color,
    red: Color,
    green: Color,
    yellow: Color,
    peach: Color,
    blue: Color,
    mauve: Color,
    lavender: Color,
}

impl Theme {
    const fn from_catppuccin(flavor: &catppuccin::Flavor) -> Self {
        let c = &flavor.colors;
        Self {
            base: to_color(&c.base),
            surface0: to_color(&c.surface0),
            overlay1: to_color(&c.overlay1),
            subtext1: to_color(&c.subtext1),
            text: to_color(&c.text),
            red: to_color(&c.red),
            green: to_color(&c.green),
            yellow: to_color(&c.yellow),
            peach: to_color(&c.peach),
            blue: to_color(&c.blue),
            mauve: to_color(&c.mauve),
            lavender: to_color(&c.lavender),
        }
    }

    pub fn catppuccin_mocha() -> Self {
        Self::from_catppuccin(&PALETTE.mocha)
    }

    pub fn catppuccin_latte() -> Self {
        Self::from_catppuccin(&PALETTE.latte)
    }

    pub fn catppuccin_frappe() -> Self {
        Self::from_catppuccin(&PALETTE.frappe)
    }

    pub fn catppuccin_macchiato() -> Self {
        Self::from_catppuccin(&PALETTE.macchiato)
    }

    pub const fn base(&self) -> Color {
        self.base
    }

    pub const fn surface0(&self) -> Color {
        self.surface0
    }

    pub const fn overlay1(&self) -> Color {
        self.overlay1
    }

    pub const fn subtext1(&self) -> Color {
        self.subtext1
    }

    pub const fn text(&self) -> Color {
        self.text
    }

    pub const fn peach(&self) -> Color {
        self.peach
    }

    pub const fn blue(&self) -> Color {
        self.blue
    }

    pub const fn mauve(&self) -> Color {
        self.mauve
    }

    pub const fn lavender(&self) -> Color {
        self.lavender
    }

    // Semantic aliases used by the components.

    pub const fn border(&self) -> Color {
        self.overlay1
    }

    pub const fn border_focused(&self) -> Color {
        self.lavender
    }

    pub const fn warning(&self) -> Color {
        self.yellow
    }

    pub const fn error(&self) -> Color {
        self.red
    }

    pub const fn success(&self) -> Color {
        self.green
    }

    pub const fn selection_bg(&self) -> Color {
        self.surface0
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::catppuccin_mocha()
    }
}

/// Resolve a theme by its configured name, falling back to the default.
pub fn theme_from_name(name: &str) -> Theme {
    match name {
        "Catppuccin Latte" => Theme::catppuccin_latte(),
        "Catppuccin Frappe" => Theme::catppuccin_frappe(),
        "Catppuccin Macchiato" => Theme::catppuccin_macchiato(),
        _ => Theme::catppuccin_mocha(),
    }
}
