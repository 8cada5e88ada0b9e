use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OrchardError, Result};
use crate::scoring::{SessionKind, TaskPriority, session_event_points};
use crate::store::SessionCompletion;

use super::{Orchard, Prediction, ProgressSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub kind: SessionKind,
    pub duration_seconds: u64,
    /// `None` for break sessions, which are neither scored nor recorded.
    pub prediction: Option<Prediction>,
    pub confirmed: ProgressSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub points_awarded: u64,
    pub prediction: Prediction,
    pub confirmed: ProgressSnapshot,
}

impl Orchard {
    pub fn complete_focus_session(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        kind: SessionKind,
    ) -> Result<SessionOutcome> {
        let elapsed = (end_time - start_time).num_seconds();
        if elapsed <= 0 {
            return Err(OrchardError::InvalidInput(format!(
                "session duration must be positive, got {elapsed}s"
            )));
        }
        let duration_seconds = elapsed.unsigned_abs();

        if !kind.is_scored() {
            tracing::debug!(user_id, %kind, duration_seconds, "break session not recorded");
            return Ok(SessionOutcome {
                kind,
                duration_seconds,
                prediction: None,
                confirmed: self.progress(user_id)?,
            });
        }

        let event_points = session_event_points(elapsed)?;
        let prediction = self.predict(user_id, event_points)?;

        self.store.record_session_completion(&SessionCompletion {
            user_id: user_id.to_string(),
            start_time,
            end_time,
            kind,
            duration_seconds,
        })?;
        let confirmed = self.progress(user_id)?;
        tracing::info!(
            user_id,
            duration_seconds,
            event_points,
            point_total = confirmed.point_total,
            "focus session completed"
        );

        Ok(SessionOutcome {
            kind,
            duration_seconds,
            prediction: Some(prediction),
            confirmed,
        })
    }

    pub fn complete_task(
        &self,
        user_id: &str,
        task_id: &str,
        priority: TaskPriority,
        completed_at: DateTime<Utc>,
    ) -> Result<TaskOutcome> {
        let prediction = self.predict(user_id, priority.points())?;

        let points_awarded = self
            .store
            .record_task_completion(user_id, task_id, completed_at)?;
        if points_awarded != priority.points() {
            tracing::warn!(
                user_id,
                task_id,
                expected = priority.points(),
                awarded = points_awarded,
                "store awarded different task points than predicted"
            );
        }
        let confirmed = self.progress(user_id)?;
        tracing::info!(
            user_id,
            task_id,
            points_awarded,
            point_total = confirmed.point_total,
            "task completed"
        );

        Ok(TaskOutcome {
            points_awarded,
            prediction,
            confirmed,
        })
    }
}
