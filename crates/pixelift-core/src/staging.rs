//! The transformation staging workflow.
//!
//! A [`StagingSession`] accumulates a pending configuration fragment while the
//! user edits transformation parameters, then coordinates the apply step with
//! the credit debit. Apply is two-phase: [`StagingSession::begin_apply`] hands
//! the caller the merged configuration to persist together with the debit, and
//! the session only commits the merge via [`StagingSession::commit_apply`]
//! once the debit succeeded. [`StagingSession::abort_apply`] rolls back to
//! the staged state otherwise, leaving the committed configuration untouched.
//!
//! Phases:
//!
//! ```text
//! Idle ── stage_field / media_attached ──▶ Staged ── begin_apply ──▶ Applying
//!   ▲                                        ▲                          │
//!   └── (new session) ───────────────────────┴── abort_apply ◀──────────┤
//!                                                commit_apply ──▶ Applied
//! ```
//!
//! Saving runs as a parallel phase (`Editing → Submitting → Saved`) since the
//! record can be persisted independently of whether a fragment is staged.

use serde::{Deserialize, Serialize};

use crate::{
    plans::TRANSFORMATION_FEE, AspectRatio, ParamField, TransformationConfig, TransformationKind,
};

/// Where the session stands with respect to the pending fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    /// No pending fragment; apply is disabled.
    Idle,
    /// A fragment is staged and may be applied.
    Staged,
    /// An apply is in flight; awaiting the debit outcome.
    Applying,
    /// The last apply committed.
    Applied,
}

/// Where the session stands with respect to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    /// Not yet submitted.
    Editing,
    /// A save is in flight (or failed and may be retried).
    Submitting,
    /// The record was persisted.
    Saved,
}

/// Errors from illegal workflow transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    /// Apply requested with no staged fragment.
    #[error("no transformation staged")]
    NothingStaged,

    /// Apply requested while a previous apply is still settling.
    #[error("an apply is already in flight")]
    ApplyInFlight,

    /// Commit or abort without a begun apply.
    #[error("no apply in flight")]
    NotApplying,

    /// Save requested while a save is already in flight.
    #[error("a save is already in flight")]
    SaveInFlight,
}

/// Client-resident state for one transformation form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingSession {
    kind: TransformationKind,
    /// Committed configuration (persisted shape).
    config: TransformationConfig,
    /// Uncommitted fragment awaiting apply.
    staged: Option<TransformationConfig>,
    /// Merge result held while the debit settles.
    pending: Option<TransformationConfig>,
    phase: StagePhase,
    save: SavePhase,
    last_save_error: Option<String>,
    aspect_ratio: Option<AspectRatio>,
}

impl StagingSession {
    /// Start a session for `kind`, seeded with the image's committed
    /// configuration (empty for the create flow).
    #[must_use]
    pub fn new(kind: TransformationKind, config: TransformationConfig) -> Self {
        Self {
            kind,
            config,
            staged: None,
            pending: None,
            phase: StagePhase::Idle,
            save: SavePhase::Editing,
            last_save_error: None,
            aspect_ratio: None,
        }
    }

    /// The transformation kind this session edits.
    #[must_use]
    pub const fn kind(&self) -> TransformationKind {
        self.kind
    }

    /// The committed configuration.
    #[must_use]
    pub const fn config(&self) -> &TransformationConfig {
        &self.config
    }

    /// The staged fragment, if any.
    #[must_use]
    pub const fn staged(&self) -> Option<&TransformationConfig> {
        self.staged.as_ref()
    }

    /// Current stage phase.
    #[must_use]
    pub const fn phase(&self) -> StagePhase {
        self.phase
    }

    /// Current save phase.
    #[must_use]
    pub const fn save_phase(&self) -> SavePhase {
        self.save
    }

    /// The selected aspect ratio, if any.
    #[must_use]
    pub const fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.aspect_ratio
    }

    /// Error surfaced by the last failed save.
    #[must_use]
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Notify the session that media is present.
    ///
    /// Parameterless kinds (restore, background removal) have nothing to edit,
    /// so their full fragment stages as soon as an image is attached.
    pub fn media_attached(&mut self) {
        if self.kind.is_parameterless() && self.staged.is_none() {
            self.staged = Some(self.kind.default_fragment());
            self.phase = StagePhase::Staged;
        }
    }

    /// Stage a field edit (prompt or color) into the pending fragment.
    pub fn stage_field(&mut self, field: ParamField, value: &str) {
        let fragment = self
            .staged
            .get_or_insert_with(TransformationConfig::new);
        fragment.set_param(
            self.kind.config_key(),
            field.config_key(),
            serde_json::Value::String(value.to_string()),
        );
        self.phase = StagePhase::Staged;
    }

    /// Stage the kind's full fragment for an aspect-ratio selection
    /// (generative fill).
    pub fn select_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.aspect_ratio = Some(ratio);
        self.staged = Some(self.kind.default_fragment());
        self.phase = StagePhase::Staged;
    }

    /// Whether the apply action is enabled. This is the workflow's sole guard.
    #[must_use]
    pub const fn can_apply(&self) -> bool {
        self.staged.is_some() && !matches!(self.phase, StagePhase::Applying)
    }

    /// Begin an apply: compute the merge and hold it until the debit settles.
    ///
    /// Returns the merged configuration the caller should persist atomically
    /// with the credit debit, and the fee to debit.
    ///
    /// # Errors
    ///
    /// - [`StagingError::NothingStaged`] if no fragment is staged.
    /// - [`StagingError::ApplyInFlight`] if a previous apply has not settled.
    pub fn begin_apply(&mut self) -> Result<(TransformationConfig, i64), StagingError> {
        if matches!(self.phase, StagePhase::Applying) {
            return Err(StagingError::ApplyInFlight);
        }
        let staged = self.staged.as_ref().ok_or(StagingError::NothingStaged)?;

        let merged = self.config.merged(staged);
        self.pending = Some(merged.clone());
        self.phase = StagePhase::Applying;
        Ok((merged, TRANSFORMATION_FEE))
    }

    /// Commit the in-flight apply after a successful debit.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::NotApplying`] if no apply is in flight.
    pub fn commit_apply(&mut self) -> Result<&TransformationConfig, StagingError> {
        let merged = self.pending.take().ok_or(StagingError::NotApplying)?;
        self.config = merged;
        self.staged = None;
        self.phase = StagePhase::Applied;
        Ok(&self.config)
    }

    /// Roll back the in-flight apply after a failed debit.
    ///
    /// The staged fragment is retained and the committed configuration is
    /// unchanged, so the user can retry once they have credits.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::NotApplying`] if no apply is in flight.
    pub fn abort_apply(&mut self) -> Result<(), StagingError> {
        if self.pending.take().is_none() {
            return Err(StagingError::NotApplying);
        }
        self.phase = StagePhase::Staged;
        Ok(())
    }

    /// Begin persisting the record.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::SaveInFlight`] if a save is already in flight
    /// and has not failed.
    pub fn begin_save(&mut self) -> Result<(), StagingError> {
        if matches!(self.save, SavePhase::Submitting) && self.last_save_error.is_none() {
            return Err(StagingError::SaveInFlight);
        }
        self.last_save_error = None;
        self.save = SavePhase::Submitting;
        Ok(())
    }

    /// Mark the in-flight save as persisted.
    pub fn complete_save(&mut self) {
        self.save = SavePhase::Saved;
        self.last_save_error = None;
    }

    /// Record a failed save; the session stays in `Submitting` with the error
    /// surfaced, and `begin_save` may be called again to retry.
    pub fn fail_save(&mut self, error: impl Into<String>) {
        self.last_save_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_disabled_when_idle() {
        let mut session =
            StagingSession::new(TransformationKind::Remove, TransformationConfig::new());
        assert_eq!(session.phase(), StagePhase::Idle);
        assert!(!session.can_apply());
        assert_eq!(session.begin_apply(), Err(StagingError::NothingStaged));
    }

    #[test]
    fn field_edit_stages_fragment() {
        let mut session =
            StagingSession::new(TransformationKind::Remove, TransformationConfig::new());
        session.stage_field(ParamField::Prompt, "car");

        assert_eq!(session.phase(), StagePhase::Staged);
        assert_eq!(
            session.staged().unwrap().to_value(),
            json!({ "remove": { "prompt": "car" } })
        );
        assert!(session.can_apply());
    }

    #[test]
    fn recolor_edits_accumulate_in_one_fragment() {
        let mut session =
            StagingSession::new(TransformationKind::Recolor, TransformationConfig::new());
        session.stage_field(ParamField::Prompt, "shirt");
        session.stage_field(ParamField::Color, "red");

        assert_eq!(
            session.staged().unwrap().to_value(),
            json!({ "recolor": { "prompt": "shirt", "to": "red" } })
        );
    }

    #[test]
    fn commit_merges_and_clears_fragment() {
        let existing = TransformationConfig::from_value(&json!({
            "remove": { "prompt": "car" }
        }));
        let mut session = StagingSession::new(TransformationKind::Recolor, existing);
        session.stage_field(ParamField::Color, "red");

        let (merged, fee) = session.begin_apply().unwrap();
        assert_eq!(fee, TRANSFORMATION_FEE);
        assert_eq!(session.phase(), StagePhase::Applying);
        assert_eq!(
            merged.to_value(),
            json!({ "remove": { "prompt": "car" }, "recolor": { "to": "red" } })
        );

        session.commit_apply().unwrap();
        assert_eq!(session.phase(), StagePhase::Applied);
        assert!(session.staged().is_none());
        assert_eq!(session.config().to_value(), merged.to_value());
    }

    #[test]
    fn abort_rolls_back_to_staged() {
        let mut session =
            StagingSession::new(TransformationKind::Remove, TransformationConfig::new());
        session.stage_field(ParamField::Prompt, "car");
        let before = session.config().clone();

        session.begin_apply().unwrap();
        session.abort_apply().unwrap();

        assert_eq!(session.phase(), StagePhase::Staged);
        assert_eq!(session.config(), &before);
        assert!(session.staged().is_some());
        // Retry is possible.
        assert!(session.begin_apply().is_ok());
    }

    #[test]
    fn double_apply_rejected_while_in_flight() {
        let mut session =
            StagingSession::new(TransformationKind::Remove, TransformationConfig::new());
        session.stage_field(ParamField::Prompt, "car");
        session.begin_apply().unwrap();
        assert_eq!(session.begin_apply(), Err(StagingError::ApplyInFlight));
    }

    #[test]
    fn commit_without_apply_rejected() {
        let mut session =
            StagingSession::new(TransformationKind::Remove, TransformationConfig::new());
        assert!(matches!(
            session.commit_apply(),
            Err(StagingError::NotApplying)
        ));
        assert_eq!(session.abort_apply(), Err(StagingError::NotApplying));
    }

    #[test]
    fn parameterless_kind_stages_on_media() {
        let mut session =
            StagingSession::new(TransformationKind::Restore, TransformationConfig::new());
        session.media_attached();

        assert_eq!(session.phase(), StagePhase::Staged);
        assert_eq!(
            session.staged().unwrap().to_value(),
            json!({ "restore": true })
        );
    }

    #[test]
    fn prompted_kind_does_not_stage_on_media() {
        let mut session =
            StagingSession::new(TransformationKind::Recolor, TransformationConfig::new());
        session.media_attached();
        assert_eq!(session.phase(), StagePhase::Idle);
    }

    #[test]
    fn aspect_ratio_selection_stages_fill() {
        let mut session =
            StagingSession::new(TransformationKind::Fill, TransformationConfig::new());
        session.select_aspect_ratio(AspectRatio::Phone);

        assert_eq!(session.aspect_ratio(), Some(AspectRatio::Phone));
        assert_eq!(
            session.staged().unwrap().to_value(),
            json!({ "fillBackground": true })
        );
    }

    #[test]
    fn reapplying_same_fragment_keeps_shape() {
        let mut session =
            StagingSession::new(TransformationKind::Remove, TransformationConfig::new());
        session.stage_field(ParamField::Prompt, "car");
        session.begin_apply().unwrap();
        session.commit_apply().unwrap();
        let first = session.config().clone();

        session.stage_field(ParamField::Prompt, "car");
        session.begin_apply().unwrap();
        session.commit_apply().unwrap();

        assert_eq!(session.config(), &first);
    }

    #[test]
    fn save_lifecycle() {
        let mut session =
            StagingSession::new(TransformationKind::Restore, TransformationConfig::new());
        assert_eq!(session.save_phase(), SavePhase::Editing);

        session.begin_save().unwrap();
        assert_eq!(session.save_phase(), SavePhase::Submitting);
        assert_eq!(session.begin_save(), Err(StagingError::SaveInFlight));

        session.fail_save("record store unavailable");
        assert_eq!(session.save_phase(), SavePhase::Submitting);
        assert_eq!(session.last_save_error(), Some("record store unavailable"));

        // A failed save may be retried.
        session.begin_save().unwrap();
        session.complete_save();
        assert_eq!(session.save_phase(), SavePhase::Saved);
        assert!(session.last_save_error().is_none());
    }
}
