// src/session.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::evaluator::{Evaluation, EvaluationResult, PostureEvaluator};
use crate::feedback::{FeedbackProjector, OverlayStyle, Projection, RenderInstructions};
use crate::landmarks::{DetectorOutput, LandmarkFrame};
use crate::profile::PoseProfile;

/// Surface that draws overlay instructions.
pub trait RenderSink {
    fn render(&mut self, instructions: &RenderInstructions);
}

/// Speech output for the held-seconds count. Fire-and-forget.
pub trait SpeechSink {
    fn speak(&mut self, seconds: u64);
}

/// Notified once when a practice session ends.
pub trait SessionListener {
    fn session_finished(&mut self, summary: &SessionSummary) -> anyhow::Result<()>;
}

/// Announces counts through the log when no speech engine is attached.
#[derive(Debug, Default)]
pub struct LogSpeech;

impl SpeechSink for LogSpeech {
    fn speak(&mut self, seconds: u64) {
        tracing::info!(seconds, "hold count");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub pose_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub longest_hold_seconds: u64,
    pub frames_evaluated: u64,
    pub frames_skipped: u64,
}

/// One practitioner practicing one pose. Owns its hold clock and the
/// last-spoken count, so sessions never share state.
pub struct PracticeSession {
    id: Uuid,
    profile: PoseProfile,
    evaluator: PostureEvaluator,
    projector: FeedbackProjector,
    started_at: DateTime<Utc>,
    started_ms: u64,
    last_frame_ms: u64,
    last_result: Option<EvaluationResult>,
    longest_hold_seconds: u64,
    frames_evaluated: u64,
    frames_skipped: u64,
}

impl PracticeSession {
    pub fn new(profile: PoseProfile, style: OverlayStyle, started_ms: u64) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, pose = %profile.id, "practice session started");

        Self {
            id,
            projector: FeedbackProjector::for_profile(style, &profile),
            profile,
            evaluator: PostureEvaluator::new(started_ms),
            started_at: Utc::now(),
            started_ms,
            last_frame_ms: started_ms,
            last_result: None,
            longest_hold_seconds: 0,
            frames_evaluated: 0,
            frames_skipped: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &PoseProfile {
        &self.profile
    }

    pub fn last_result(&self) -> Option<&EvaluationResult> {
        self.last_result.as_ref()
    }

    pub fn longest_hold_seconds(&self) -> u64 {
        self.longest_hold_seconds
    }

    /// Evaluates one frame. `None` means the frame was skipped and the
    /// previous overlay should stay on screen.
    pub fn on_frame(&mut self, frame: Option<&LandmarkFrame>, now_ms: u64) -> Option<Projection> {
        if now_ms < self.last_frame_ms {
            tracing::warn!(now_ms, last = self.last_frame_ms, "frame arrived out of order");
        }
        self.last_frame_ms = self.last_frame_ms.max(now_ms);

        match self.evaluator.evaluate(frame, &self.profile, now_ms) {
            Evaluation::Skipped => {
                self.frames_skipped += 1;
                None
            }
            Evaluation::Evaluated(result) => {
                self.frames_evaluated += 1;
                self.longest_hold_seconds = self.longest_hold_seconds.max(result.held_seconds);
                let projection = self.projector.project(&result);
                self.last_result = Some(result);
                Some(projection)
            }
        }
    }

    /// Scales detector output, evaluates it and forwards the feedback.
    pub fn drive(&mut self, output: &DetectorOutput, render: &mut dyn RenderSink, speech: &mut dyn SpeechSink) {
        let frame = output.to_frame();
        if let Some(projection) = self.on_frame(frame.as_ref(), output.timestamp_ms) {
            render.render(&projection.instructions);
            if let Some(cue) = projection.cue {
                speech.speak(cue.seconds);
            }
        }
    }

    pub fn finish(self, ended_ms: u64, listener: &mut dyn SessionListener) -> anyhow::Result<SessionSummary> {
        let summary = SessionSummary {
            id: self.id,
            pose_id: self.profile.id.clone(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration_ms: ended_ms.saturating_sub(self.started_ms),
            longest_hold_seconds: self.longest_hold_seconds,
            frames_evaluated: self.frames_evaluated,
            frames_skipped: self.frames_skipped,
        };
        tracing::info!(
            session = %summary.id,
            pose = %summary.pose_id,
            longest_hold = summary.longest_hold_seconds,
            "practice session finished"
        );
        listener.session_finished(&summary)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{NormalizedLandmark, LANDMARK_COUNT};
    use crate::profile::builtin;

    #[derive(Default)]
    struct Captured {
        frames: Vec<RenderInstructions>,
        summaries: Vec<SessionSummary>,
    }

    impl RenderSink for Captured {
        fn render(&mut self, instructions: &RenderInstructions) {
            self.frames.push(instructions.clone());
        }
    }

    impl SpeechSink for Vec<u64> {
        fn speak(&mut self, seconds: u64) {
            self.push(seconds);
        }
    }

    impl SessionListener for Captured {
        fn session_finished(&mut self, summary: &SessionSummary) -> anyhow::Result<()> {
            self.summaries.push(summary.clone());
            Ok(())
        }
    }

    /// Trikonasana with straight arms and a 130 degree back angle.
    fn trikonasana_output(timestamp_ms: u64, correct: bool) -> DetectorOutput {
        let mut lms = vec![None; LANDMARK_COUNT];
        let mut put = |i: usize, x: f64, y: f64| lms[i] = Some(NormalizedLandmark { x, y });
        put(11, 0.2, 0.3);
        put(13, 0.3, 0.3);
        put(15, 0.4, 0.3);
        put(12, 0.6, 0.3);
        put(14, 0.7, 0.3);
        if correct {
            put(16, 0.8, 0.3);
        } else {
            put(16, 0.7, 0.5);
        }
        // Hip straight below the right shoulder, knee 130 degrees off the torso
        let t = 130f64.to_radians();
        put(24, 0.6, 0.6);
        put(26, 0.6 + 0.2 * t.sin() * 480.0 / 640.0, 0.6 - 0.2 * t.cos());
        DetectorOutput {
            timestamp_ms,
            width: 640,
            height: 480,
            landmarks: Some(lms),
        }
    }

    #[test]
    fn test_drive_renders_and_speaks_once_per_second() {
        let profile = builtin("trikonasana").unwrap();
        let mut session = PracticeSession::new(profile, OverlayStyle::default(), 0);
        let mut sink = Captured::default();
        let mut spoken: Vec<u64> = Vec::new();

        session.drive(&trikonasana_output(0, false), &mut sink, &mut spoken);
        for t in (100..=2600).step_by(100) {
            session.drive(&trikonasana_output(t, true), &mut sink, &mut spoken);
        }

        assert_eq!(sink.frames.len(), 27);
        assert_eq!(spoken, vec![0, 1, 2]);
        assert_eq!(session.longest_hold_seconds(), 2);
        assert!(session.last_result().unwrap().all_in_range);
    }

    #[test]
    fn test_skipped_frames_do_not_render() {
        let profile = builtin("trikonasana").unwrap();
        let mut session = PracticeSession::new(profile, OverlayStyle::default(), 0);
        let mut sink = Captured::default();
        let mut spoken: Vec<u64> = Vec::new();

        let nobody = DetectorOutput {
            timestamp_ms: 500,
            width: 640,
            height: 480,
            landmarks: None,
        };
        session.drive(&nobody, &mut sink, &mut spoken);
        assert!(sink.frames.is_empty());
        assert!(spoken.is_empty());
        assert!(session.last_result().is_none());

        let summary = session.finish(1000, &mut sink).unwrap();
        assert_eq!(summary.frames_skipped, 1);
        assert_eq!(summary.frames_evaluated, 0);
        assert_eq!(summary.duration_ms, 1000);
        assert_eq!(sink.summaries.len(), 1);
        assert_eq!(sink.summaries[0].pose_id, "trikonasana");
    }

    #[test]
    fn test_sessions_are_independent() {
        let profile = builtin("trikonasana").unwrap();
        let mut a = PracticeSession::new(profile.clone(), OverlayStyle::default(), 0);
        let mut b = PracticeSession::new(profile, OverlayStyle::default(), 0);
        assert_ne!(a.id(), b.id());

        let frame = trikonasana_output(3000, true).to_frame();
        let wrong = trikonasana_output(3000, false).to_frame();
        let pa = a.on_frame(frame.as_ref(), 3000).unwrap();
        let pb = b.on_frame(wrong.as_ref(), 3000).unwrap();

        assert_eq!(a.last_result().unwrap().held_seconds, 3);
        assert_eq!(b.last_result().unwrap().held_seconds, 0);
        assert_eq!(pa.cue.map(|c| c.seconds), Some(3));
        assert_eq!(pb.cue.map(|c| c.seconds), Some(0));
    }
}
