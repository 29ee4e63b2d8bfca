use serde::{Deserialize, Serialize};

/// Expansion level of the panel, lowest first
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SheetHeight {
    #[default]
    Peek,
    Half,
    Full,
}

impl SheetHeight {
    /// One level up, saturating at [`SheetHeight::Full`]
    pub fn step_up(self) -> Self {
        match self {
            SheetHeight::Peek => SheetHeight::Half,
            SheetHeight::Half | SheetHeight::Full => SheetHeight::Full,
        }
    }

    /// One level down, saturating at [`SheetHeight::Peek`]
    pub fn step_down(self) -> Self {
        match self {
            SheetHeight::Full => SheetHeight::Half,
            SheetHeight::Half | SheetHeight::Peek => SheetHeight::Peek,
        }
    }
}
