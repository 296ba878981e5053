//! Startup state machine
//!
//! Programs compile first, then textures load, then the land outline is
//! rendered once. A failing stage is logged and the sequence moves on: the
//! renderer runs with whatever became ready.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootStage {
    LoadingShaders,
    LoadingAssets,
    OutliningLand,
    Ready,
}

impl BootStage {
    pub fn next(self) -> Self {
        match self {
            BootStage::LoadingShaders => BootStage::LoadingAssets,
            BootStage::LoadingAssets => BootStage::OutliningLand,
            BootStage::OutliningLand | BootStage::Ready => BootStage::Ready,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BootStage::LoadingShaders => "loading shaders",
            BootStage::LoadingAssets => "loading assets",
            BootStage::OutliningLand => "outlining land",
            BootStage::Ready => "ready",
        }
    }
}

/// Outcome of one completed stage
#[derive(Debug, Clone, PartialEq)]
pub struct BootStep {
    pub stage: BootStage,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct BootSequence {
    stage: BootStage,
    history: Vec<BootStep>,
}

impl Default for BootSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl BootSequence {
    pub fn new() -> Self {
        Self {
            stage: BootStage::LoadingShaders,
            history: Vec::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.stage == BootStage::Ready
    }

    /// Run the current stage and move to the next one
    pub fn advance<E: std::fmt::Display>(
        &mut self,
        step: impl FnOnce(BootStage) -> Result<(), E>,
    ) -> BootStage {
        if self.is_ready() {
            return self.stage;
        }

        let stage = self.stage;
        let start = Instant::now();
        let error = match step(stage) {
            Ok(()) => {
                log::info!("Boot: {} done in {:.1?}", stage.name(), start.elapsed());
                None
            }
            Err(e) => {
                log::error!("Boot: {} failed: {}", stage.name(), e);
                Some(e.to_string())
            }
        };
        self.history.push(BootStep { stage, error });

        self.stage = stage.next();
        self.stage
    }

    /// Run every remaining stage
    pub fn run<E: std::fmt::Display>(&mut self, mut step: impl FnMut(BootStage) -> Result<(), E>) {
        while !self.is_ready() {
            self.advance(&mut step);
        }

        let failed: Vec<&str> = self
            .history
            .iter()
            .filter(|step| step.error.is_some())
            .map(|step| step.stage.name())
            .collect();
        if failed.is_empty() {
            log::info!("Boot complete");
        } else {
            log::warn!("Boot complete; degraded stages: {}", failed.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_run_in_order() {
        let mut boot = BootSequence::new();
        let mut seen = Vec::new();
        boot.run(|stage| -> Result<(), String> {
            seen.push(stage);
            Ok(())
        });
        assert_eq!(
            seen,
            vec![
                BootStage::LoadingShaders,
                BootStage::LoadingAssets,
                BootStage::OutliningLand
            ]
        );
        assert!(boot.is_ready());
    }

    #[test]
    fn failure_is_recorded_and_boot_continues() {
        let mut boot = BootSequence::new();
        boot.run(|stage| {
            if stage == BootStage::LoadingAssets {
                Err("missing dirt.png")
            } else {
                Ok(())
            }
        });
        assert!(boot.is_ready());
        let history = &boot.history;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].error, None);
        assert_eq!(history[1].error.as_deref(), Some("missing dirt.png"));
        assert_eq!(history[2].stage, BootStage::OutliningLand);
    }

    #[test]
    fn ready_is_terminal() {
        let mut boot = BootSequence::new();
        boot.run(|_| -> Result<(), String> { Ok(()) });
        let mut ran = false;
        boot.advance(|_| -> Result<(), String> {
            ran = true;
            Ok(())
        });
        assert!(!ran);
        assert_eq!(BootStage::Ready.next(), BootStage::Ready);
    }
}
