pub mod overlay;

pub use overlay::{OverlayButton, OverlayModel};

#[cfg(target_arch = "wasm32")]
pub use overlay::DomOverlay;
