//! Simulated analysis progress.
//!
//! The indicator is cosmetic pacing, not a real progress signal: a fixed
//! (percent, label) table advanced on a fixed cadence, independent of the
//! in-flight request. The sequence always reaches 100% before the analyze
//! outcome is consumed.

use crate::model::WorkflowEvent;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub(crate) const PROGRESS_STEPS: [(u8, &str); 5] = [
    (10, "Uploading document"),
    (35, "Extracting text"),
    (60, "Identifying clauses"),
    (85, "Simplifying language"),
    (100, "Finalizing analysis"),
];

/// Emit the full step table, pausing `step` between entries.
pub(crate) async fn run_progress_steps(step: Duration, event_tx: &UnboundedSender<WorkflowEvent>) {
    for (percent, label) in PROGRESS_STEPS {
        let _ = event_tx.send(WorkflowEvent::ProgressStep {
            percent,
            label: label.to_string(),
        });
        tokio::time::sleep(step).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_increasing_and_end_at_full() {
        let percents: Vec<u8> = PROGRESS_STEPS.iter().map(|(p, _)| *p).collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*percents.last().unwrap(), 100);
    }

    #[tokio::test]
    async fn emits_every_step_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        run_progress_steps(Duration::from_millis(1), &tx).await;
        drop(tx);

        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            if let WorkflowEvent::ProgressStep { percent, .. } = ev {
                seen.push(percent);
            }
        }
        assert_eq!(seen, vec![10, 35, 60, 85, 100]);
    }
}
