use ratatui::style::Color;

/// Colors a reading theme assigns to the interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: Color, // Content background
    pub foreground: Color, // Body text
    pub panel: Color,      // TOC and status bar background
    pub heading: Color,
    pub accent: Color, // Quotes, images, form fields
    pub link: Color,
    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ThemeId {
    #[default]
    Day,
    Night,
    RetroBeige,
    EyeComfortGreen,
    Monokai,
    Nord,
    Dracula,
    OneDark,
    GithubDark,
    Gruvbox,
    TokyoNight,
    Catppuccin,
}

impl ThemeId {
    pub fn all() -> &'static [ThemeId] {
        &[
            ThemeId::Day,
            ThemeId::Night,
            ThemeId::RetroBeige,
            ThemeId::EyeComfortGreen,
            ThemeId::Monokai,
            ThemeId::Nord,
            ThemeId::Dracula,
            ThemeId::OneDark,
            ThemeId::GithubDark,
            ThemeId::Gruvbox,
            ThemeId::TokyoNight,
            ThemeId::Catppuccin,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeId::Day => "Day",
            ThemeId::Night => "Night",
            ThemeId::RetroBeige => "Retro Beige",
            ThemeId::EyeComfortGreen => "Eye Comfort Green",
            ThemeId::Monokai => "Monokai",
            ThemeId::Nord => "Nord",
            ThemeId::Dracula => "Dracula",
            ThemeId::OneDark => "One Dark",
            ThemeId::GithubDark => "GitHub Dark",
            ThemeId::Gruvbox => "Gruvbox",
            ThemeId::TokyoNight => "Tokyo Night",
            ThemeId::Catppuccin => "Catppuccin",
        }
    }

    /// Stable key stored in the settings file.
    pub fn key(&self) -> &'static str {
        match self {
            ThemeId::Day => "light",
            ThemeId::Night => "dark",
            ThemeId::RetroBeige => "sepia",
            ThemeId::EyeComfortGreen => "green",
            ThemeId::Monokai => "monokai",
            ThemeId::Nord => "nord",
            ThemeId::Dracula => "dracula",
            ThemeId::OneDark => "one_dark",
            ThemeId::GithubDark => "github_dark",
            ThemeId::Gruvbox => "gruvbox",
            ThemeId::TokyoNight => "tokyo_night",
            ThemeId::Catppuccin => "catppuccin",
        }
    }

    /// Unknown keys fall back to the day theme.
    pub fn from_key(key: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|theme| theme.key() == key)
            .unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn palette(&self) -> &'static Palette {
        match self {
            ThemeId::Day => &DAY,
            ThemeId::Night => &NIGHT,
            ThemeId::RetroBeige => &RETRO_BEIGE,
            ThemeId::EyeComfortGreen => &EYE_COMFORT_GREEN,
            ThemeId::Monokai => &MONOKAI,
            ThemeId::Nord => &NORD,
            ThemeId::Dracula => &DRACULA,
            ThemeId::OneDark => &ONE_DARK,
            ThemeId::GithubDark => &GITHUB_DARK,
            ThemeId::Gruvbox => &GRUVBOX,
            ThemeId::TokyoNight => &TOKYO_NIGHT,
            ThemeId::Catppuccin => &CATPPUCCIN,
        }
    }
}

static DAY: Palette = Palette {
    background: rgb(0xFFFFFF),
    foreground: rgb(0x333333),
    panel: rgb(0xF5F5F5),
    heading: rgb(0x1565C0),
    accent: rgb(0x0078D7),
    link: rgb(0x1976D2),
    border: rgb(0xE0E0E0),
    selection_bg: rgb(0x0078D7),
    selection_fg: rgb(0xFFFFFF),
};

static NIGHT: Palette = Palette {
    background: rgb(0x1E1E1E),
    foreground: rgb(0xD4D4D4),
    panel: rgb(0x252526),
    heading: rgb(0x569CD6),
    accent: rgb(0x569CD6),
    link: rgb(0x4FC3F7),
    border: rgb(0x3C3C3C),
    selection_bg: rgb(0x264F78),
    selection_fg: rgb(0xFFFFFF),
};

static RETRO_BEIGE: Palette = Palette {
    background: rgb(0xFAF8F2),
    foreground: rgb(0x5C4B37),
    panel: rgb(0xFAF6ED),
    heading: rgb(0x8B7355),
    accent: rgb(0xA0826D),
    link: rgb(0xA0826D),
    border: rgb(0xE6DCC8),
    selection_bg: rgb(0xC9B896),
    selection_fg: rgb(0x3D3225),
};

static EYE_COMFORT_GREEN: Palette = Palette {
    background: rgb(0xF9FBE7),
    foreground: rgb(0x33691E),
    panel: rgb(0xF1F8E9),
    heading: rgb(0x388E3C),
    accent: rgb(0x4CAF50),
    link: rgb(0x43A047),
    border: rgb(0xC8E6C9),
    selection_bg: rgb(0x81C784),
    selection_fg: rgb(0x1B5E20),
};

static MONOKAI: Palette = Palette {
    background: rgb(0x272822),
    foreground: rgb(0xF8F8F2),
    panel: rgb(0x1E1F1C),
    heading: rgb(0xF92672),
    accent: rgb(0xA6E22E),
    link: rgb(0x66D9EF),
    border: rgb(0x3E3D32),
    selection_bg: rgb(0x49483E),
    selection_fg: rgb(0xF8F8F2),
};

static NORD: Palette = Palette {
    background: rgb(0x2E3440),
    foreground: rgb(0xE5E9F0),
    panel: rgb(0x3B4252),
    heading: rgb(0x88C0D0),
    accent: rgb(0x88C0D0),
    link: rgb(0x81A1C1),
    border: rgb(0x434C5E),
    selection_bg: rgb(0x5E81AC),
    selection_fg: rgb(0xECEFF4),
};

static DRACULA: Palette = Palette {
    background: rgb(0x282A36),
    foreground: rgb(0xF8F8F2),
    panel: rgb(0x21222C),
    heading: rgb(0xFF79C6),
    accent: rgb(0xBD93F9),
    link: rgb(0x8BE9FD),
    border: rgb(0x44475A),
    selection_bg: rgb(0x44475A),
    selection_fg: rgb(0xF8F8F2),
};

static ONE_DARK: Palette = Palette {
    background: rgb(0x282C34),
    foreground: rgb(0xABB2BF),
    panel: rgb(0x21252B),
    heading: rgb(0xE06C75),
    accent: rgb(0x61AFEF),
    link: rgb(0x61AFEF),
    border: rgb(0x181A1F),
    selection_bg: rgb(0x3E4451),
    selection_fg: rgb(0xD7DAE0),
};

static GITHUB_DARK: Palette = Palette {
    background: rgb(0x0D1117),
    foreground: rgb(0xC9D1D9),
    panel: rgb(0x161B22),
    heading: rgb(0x58A6FF),
    accent: rgb(0x238636),
    link: rgb(0x58A6FF),
    border: rgb(0x30363D),
    selection_bg: rgb(0x238636),
    selection_fg: rgb(0xFFFFFF),
};

static GRUVBOX: Palette = Palette {
    background: rgb(0x282828),
    foreground: rgb(0xEBDBB2),
    panel: rgb(0x1D2021),
    heading: rgb(0xFABD2F),
    accent: rgb(0xB8BB26),
    link: rgb(0x83A598),
    border: rgb(0x3C3836),
    selection_bg: rgb(0x504945),
    selection_fg: rgb(0xFBF1C7),
};

static TOKYO_NIGHT: Palette = Palette {
    background: rgb(0x1A1B26),
    foreground: rgb(0xA9B1D6),
    panel: rgb(0x16161E),
    heading: rgb(0x7AA2F7),
    accent: rgb(0xBB9AF7),
    link: rgb(0x7DCFFF),
    border: rgb(0x2F3549),
    selection_bg: rgb(0x364A82),
    selection_fg: rgb(0xC0CAF5),
};

static CATPPUCCIN: Palette = Palette {
    background: rgb(0x1E1E2E),
    foreground: rgb(0xCDD6F4),
    panel: rgb(0x181825),
    heading: rgb(0xCBA6F7),
    accent: rgb(0xF5C2E7),
    link: rgb(0x89B4FA),
    border: rgb(0x313244),
    selection_bg: rgb(0x45475A),
    selection_fg: rgb(0xCDD6F4),
};
