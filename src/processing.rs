use serde_json::json;

use crate::error::{Result, TimelineError};
use crate::model::{ClipId, ClipPatch, ClipStatus};
use crate::store::TimelineStore;

#[derive(Debug, Clone, PartialEq)]
struct ProcessingJob {
    clip_id: ClipId,
    revision: u64,
    due_ms: f64,
}

/// Simulated generation: clips sit in `Processing` for a fixed delay, then complete.
///
/// A job only lands if its clip still exists at the revision it was started
/// with. Deleting a clip drops its result; editing one drops the result and
/// returns the clip to `Idle`.
#[derive(Debug, Clone)]
pub struct ProcessingQueue {
    delay_ms: f64,
    jobs: Vec<ProcessingJob>,
}

impl ProcessingQueue {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms: delay_ms as f64,
            jobs: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_pending(&self, clip_id: ClipId) -> bool {
        self.jobs.iter().any(|j| j.clip_id == clip_id)
    }

    pub fn enqueue(
        &mut self,
        store: &mut TimelineStore,
        clip_id: ClipId,
        now_ms: f64,
    ) -> Result<()> {
        store.update_clip(
            clip_id,
            ClipPatch {
                status: Some(ClipStatus::Processing),
                ..Default::default()
            },
        )?;
        let revision = store
            .clip(clip_id)
            .map(|c| c.revision)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;

        self.jobs.retain(|j| j.clip_id != clip_id);
        self.jobs.push(ProcessingJob {
            clip_id,
            revision,
            due_ms: now_ms + self.delay_ms,
        });
        log::debug!("Queued clip {} for processing", clip_id);
        Ok(())
    }

    /// Drop the job and put the clip back to `Idle` if it is still waiting.
    pub fn cancel(&mut self, store: &mut TimelineStore, clip_id: ClipId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.clip_id != clip_id);
        if before == self.jobs.len() {
            return false;
        }
        if store
            .clip(clip_id)
            .is_some_and(|c| c.status == ClipStatus::Processing)
        {
            let _ = store.update_clip(
                clip_id,
                ClipPatch {
                    status: Some(ClipStatus::Idle),
                    ..Default::default()
                },
            );
        }
        true
    }

    /// Complete every job that is due. Returns the clips that completed.
    pub fn poll(&mut self, store: &mut TimelineStore, now_ms: f64) -> Vec<ClipId> {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.jobs.drain(..).partition(|j| j.due_ms <= now_ms);
        self.jobs = waiting;

        let mut completed = Vec::new();
        for job in due {
            let Some(clip) = store.clip(job.clip_id) else {
                log::debug!("Dropping processing result for deleted clip {}", job.clip_id);
                continue;
            };
            if clip.revision != job.revision {
                log::debug!("Dropping stale processing result for clip {}", job.clip_id);
                if clip.status == ClipStatus::Processing {
                    let _ = store.update_clip(
                        job.clip_id,
                        ClipPatch {
                            status: Some(ClipStatus::Idle),
                            ..Default::default()
                        },
                    );
                }
                continue;
            }
            let output = json!({
                "prompt": clip.content,
                "completed_at_ms": now_ms,
            });
            let patch = ClipPatch {
                status: Some(ClipStatus::Complete),
                output: Some(Some(output)),
                ..Default::default()
            };
            if store.update_clip(job.clip_id, patch).is_ok() {
                completed.push(job.clip_id);
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClipBuilder, TrackBuilder};

    fn setup() -> (TimelineStore, ClipId) {
        let mut store = TimelineStore::new();
        let track = store.add_track(TrackBuilder::default()).unwrap();
        let clip = store
            .add_clip(ClipBuilder::new(track).with_content("strings swell"))
            .unwrap();
        (store, clip)
    }

    #[test]
    fn test_job_completes_after_delay() {
        let (mut store, clip) = setup();
        let mut queue = ProcessingQueue::new(2000);
        queue.enqueue(&mut store, clip, 0.0).unwrap();
        assert_eq!(store.clip(clip).unwrap().status, ClipStatus::Processing);

        assert!(queue.poll(&mut store, 1999.0).is_empty());
        assert_eq!(queue.poll(&mut store, 2000.0), vec![clip]);
        let c = store.clip(clip).unwrap();
        assert_eq!(c.status, ClipStatus::Complete);
        assert_eq!(c.output.as_ref().unwrap()["prompt"], "strings swell");
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_deleted_clip_is_not_resurrected() {
        let (mut store, clip) = setup();
        let mut queue = ProcessingQueue::new(10);
        queue.enqueue(&mut store, clip, 0.0).unwrap();
        store.remove_clip(clip).unwrap();
        assert!(queue.poll(&mut store, 100.0).is_empty());
        assert!(store.clip(clip).is_none());
    }

    #[test]
    fn test_edit_cancels_pending_result() {
        let (mut store, clip) = setup();
        let mut queue = ProcessingQueue::new(10);
        queue.enqueue(&mut store, clip, 0.0).unwrap();
        store.resize_clip(clip, 8.0).unwrap();
        assert!(queue.poll(&mut store, 100.0).is_empty());
        let c = store.clip(clip).unwrap();
        assert_eq!(c.status, ClipStatus::Idle);
        assert!(c.output.is_none());
    }

    #[test]
    fn test_cancel_resets_status() {
        let (mut store, clip) = setup();
        let mut queue = ProcessingQueue::new(10);
        queue.enqueue(&mut store, clip, 0.0).unwrap();
        assert!(queue.cancel(&mut store, clip));
        assert!(!queue.cancel(&mut store, clip));
        assert_eq!(store.clip(clip).unwrap().status, ClipStatus::Idle);
    }

    #[test]
    fn test_enqueue_missing_clip_fails() {
        let (mut store, _) = setup();
        let mut queue = ProcessingQueue::new(10);
        assert!(queue.enqueue(&mut store, 999, 0.0).is_err());
        assert_eq!(queue.pending(), 0);
    }
}
