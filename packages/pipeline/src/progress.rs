//! Stage progress reporting.
//!
//! A [`Session`](crate::Session) reports each pipeline [`Stage`] through a
//! [`ProgressCallback`]. The trait carries no rendering of its own; a
//! binary plugs in terminal bars, tests and library callers use
//! [`NullProgress`].

use std::sync::Arc;

/// One step of a surface calculation, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Well samples onto the primary grid.
    InterpolatePrimary,
    /// Tract centroids onto the secondary grid.
    InterpolateSecondary,
    /// Secondary grid values averaged into primary cells.
    Join,
    /// Regression fit and residuals.
    Fit,
    /// Class breaks for the grid layers.
    Classify,
}

impl Stage {
    pub const ALL: &[Self] = &[
        Self::InterpolatePrimary,
        Self::InterpolateSecondary,
        Self::Join,
        Self::Fit,
        Self::Classify,
    ];

    /// Zero-based position in the run.
    #[must_use]
    pub const fn position(self) -> u64 {
        match self {
            Self::InterpolatePrimary => 0,
            Self::InterpolateSecondary => 1,
            Self::Join => 2,
            Self::Fit => 3,
            Self::Classify => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InterpolatePrimary | Self::InterpolateSecondary => "interpolate",
            Self::Join => "join",
            Self::Fit => "fit",
            Self::Classify => "classify",
        }
    }
}

/// Receives progress from a pipeline run.
///
/// `Send + Sync` so one instance can be shared behind an `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Total number of stages in the run.
    fn set_total(&self, total: u64);

    /// Number of completed stages.
    fn set_position(&self, pos: u64);

    fn set_message(&self, msg: String);

    /// The run completed with a final message.
    fn finish(&self, msg: String);

    /// The run ended; remove any indicator.
    fn finish_and_clear(&self);

    /// Marks `stage` as started. The message reads `[n/total] label: detail`.
    fn start_stage(&self, stage: Stage, detail: &str) {
        self.set_position(stage.position());
        self.set_message(format!(
            "[{}/{}] {}: {detail}",
            stage.position() + 1,
            Stage::ALL.len(),
            stage.label()
        ));
    }

    fn complete_stage(&self, stage: Stage) {
        self.set_position(stage.position() + 1);
    }
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
    fn start_stage(&self, _stage: Stage, _detail: &str) {}
}

/// A shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl ProgressCallback for Log {
        fn set_total(&self, _total: u64) {}
        fn set_position(&self, pos: u64) {
            self.0.lock().unwrap().push(format!("pos {pos}"));
        }
        fn set_message(&self, msg: String) {
            self.0.lock().unwrap().push(msg);
        }
        fn finish(&self, _msg: String) {}
        fn finish_and_clear(&self) {}
    }

    #[test]
    fn positions_follow_run_order() {
        for (index, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.position(), index as u64);
        }
    }

    #[test]
    fn stage_messages_carry_step_and_detail() {
        let log = Log::default();
        log.start_stage(Stage::Join, "canrate");
        log.complete_stage(Stage::Join);

        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                "pos 2".to_string(),
                "[3/5] join: canrate".to_string(),
                "pos 3".to_string(),
            ]
        );
    }
}
