//! The single shared disclosure panel: which domain owns it and how far it
//! is expanded.

pub mod arbitrator;
pub mod content;
pub mod sheet;

pub use arbitrator::{
    CloseAction, DisclosureArbitrator, PanelState, PanelTab, ScrollDirection, ScrollOutcome,
};
pub use content::{ContentInputs, ContentType};
pub use sheet::SheetHeight;
