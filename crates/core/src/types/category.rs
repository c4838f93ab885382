//! Mod catalog categories.

use serde::{Deserialize, Serialize};

/// Category a mod is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "mod_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ModCategory {
    Drift,
    Cars,
    Maps,
    Tracks,
    Graphics,
    Sounds,
    Gameplay,
    Ui,
    Tools,
}

impl ModCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 9] = [
        Self::Drift,
        Self::Cars,
        Self::Maps,
        Self::Tracks,
        Self::Graphics,
        Self::Sounds,
        Self::Gameplay,
        Self::Ui,
        Self::Tools,
    ];

    /// The snake_case slug used in URLs and JSON.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::Cars => "cars",
            Self::Maps => "maps",
            Self::Tracks => "tracks",
            Self::Graphics => "graphics",
            Self::Sounds => "sounds",
            Self::Gameplay => "gameplay",
            Self::Ui => "ui",
            Self::Tools => "tools",
        }
    }
}

impl std::fmt::Display for ModCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for ModCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid mod category: {s}"))
    }
}
