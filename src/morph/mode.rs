use serde::{Deserialize, Serialize};

/// Which target set every animated entity eases toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MorphMode {
    /// Entities drift on a spherical shell
    #[default]
    Scattered,
    /// Entities gather into the cone
    TreeShape,
}

impl MorphMode {
    pub fn is_tree(self) -> bool {
        self == MorphMode::TreeShape
    }

    pub fn toggled(self) -> Self {
        match self {
            MorphMode::Scattered => MorphMode::TreeShape,
            MorphMode::TreeShape => MorphMode::Scattered,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MorphMode::Scattered => "SCATTERED",
            MorphMode::TreeShape => "TREE_SHAPE",
        }
    }
}

/// Holds the current mode; the UI is its only writer.
///
/// The integrator never reads this directly: the engine copies `mode()` into
/// each frame's integration pass.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: MorphMode,
}

impl ModeController {
    pub fn new(initial: MorphMode) -> Self {
        Self { mode: initial }
    }

    pub fn mode(&self) -> MorphMode {
        self.mode
    }

    /// Replace the mode unconditionally. Returns whether it changed.
    pub fn set_mode(&mut self, mode: MorphMode) -> bool {
        let changed = self.mode != mode;
        if changed {
            log::debug!("morph mode {} -> {}", self.mode.label(), mode.label());
        }
        self.mode = mode;
        changed
    }

    /// The "SCATTER" action
    pub fn scatter(&mut self) -> bool {
        self.set_mode(MorphMode::Scattered)
    }

    /// The "ASSEMBLE" action
    pub fn assemble(&mut self) -> bool {
        self.set_mode(MorphMode::TreeShape)
    }

    pub fn toggle(&mut self) -> MorphMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_scattered() {
        assert_eq!(ModeController::default().mode(), MorphMode::Scattered);
    }

    #[test]
    fn test_set_mode_reports_change() {
        let mut controller = ModeController::default();
        assert!(controller.assemble());
        assert!(!controller.assemble());
        assert_eq!(controller.mode(), MorphMode::TreeShape);
        assert!(controller.scatter());
        assert_eq!(controller.mode(), MorphMode::Scattered);
    }

    #[test]
    fn test_rapid_toggling_is_legal() {
        let mut controller = ModeController::new(MorphMode::TreeShape);
        for _ in 0..5 {
            controller.toggle();
        }
        assert_eq!(controller.mode(), MorphMode::Scattered);
    }

    #[test]
    fn test_mode_serializes_by_name() {
        let yaml = serde_yaml::to_string(&MorphMode::TreeShape).unwrap();
        assert_eq!(yaml.trim(), "TreeShape");
        let mode: MorphMode = serde_yaml::from_str("Scattered").unwrap();
        assert_eq!(mode, MorphMode::Scattered);
    }
}
