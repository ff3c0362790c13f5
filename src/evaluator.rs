// src/evaluator.rs
use serde::Serialize;

use crate::geometry::{angle_at_vertex, Point2D};
use crate::landmarks::{group, LandmarkFrame};
use crate::profile::PoseProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointResult {
    pub name: String,
    pub angle_degrees: i32,
    pub in_range: bool,
    /// Empty when the joint's landmarks were not all detected.
    pub points: Vec<Point2D>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub joints: Vec<JointResult>,
    pub all_in_range: bool,
    pub held_seconds: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Evaluated(EvaluationResult),
    /// No body in the frame; nothing changes and nothing is redrawn.
    Skipped,
}

/// Start of the current correct-hold streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldState {
    pub last_reset_ms: u64,
}

impl HoldState {
    pub fn new(now_ms: u64) -> Self {
        Self { last_reset_ms: now_ms }
    }

    pub fn held_seconds(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_reset_ms) / 1000
    }
}

pub struct PostureEvaluator {
    hold: HoldState,
}

impl PostureEvaluator {
    pub fn new(started_ms: u64) -> Self {
        Self {
            hold: HoldState::new(started_ms),
        }
    }

    pub fn hold_state(&self) -> HoldState {
        self.hold
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.hold = HoldState::new(now_ms);
    }

    pub fn evaluate(&mut self, frame: Option<&LandmarkFrame>, profile: &PoseProfile, now_ms: u64) -> Evaluation {
        let frame = match frame {
            Some(frame) if !frame.has_no_landmarks() => frame,
            _ => return Evaluation::Skipped,
        };

        let groups = group(frame, profile);
        if !groups.is_empty() && groups.iter().all(|g| g.points.is_none()) {
            tracing::debug!(profile = %profile.id, "no joint group visible, skipping frame");
            return Evaluation::Skipped;
        }

        let joints: Vec<JointResult> = groups
            .into_iter()
            .zip(&profile.joints)
            .map(|(grouped, joint)| match grouped.points {
                Some(points) => {
                    let angle = angle_at_vertex(&points).round() as i32;
                    JointResult {
                        name: grouped.name,
                        angle_degrees: angle,
                        in_range: joint.range.contains(angle),
                        points,
                    }
                }
                None => JointResult {
                    name: grouped.name,
                    angle_degrees: 0,
                    in_range: false,
                    points: Vec::new(),
                },
            })
            .collect();

        let all_in_range = !joints.is_empty() && joints.iter().all(|j| j.in_range);

        let held_seconds = if all_in_range {
            self.hold.held_seconds(now_ms)
        } else {
            self.hold.last_reset_ms = now_ms;
            0
        };

        tracing::debug!(
            profile = %profile.id,
            all_in_range,
            held_seconds,
            "evaluated frame"
        );

        Evaluation::Evaluated(EvaluationResult {
            joints,
            all_in_range,
            held_seconds,
            timestamp_ms: now_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LANDMARK_COUNT;
    use crate::profile::{builtin, AngleRange, JointGroup};

    fn single_joint_profile(min: i32, max: i32) -> PoseProfile {
        PoseProfile {
            id: "test".to_string(),
            display_name: String::new(),
            joints: vec![JointGroup::new("left_arm", [11, 13, 15], AngleRange::new(min, max))],
        }
    }

    /// Frame whose left arm bends to `degrees` at the elbow.
    fn arm_frame(degrees: f64) -> LandmarkFrame {
        let mut points = vec![None; LANDMARK_COUNT];
        let elbow = Point2D::new(300.0, 300.0);
        let t = degrees.to_radians();
        points[11] = Some(Point2D::new(elbow.x + 100.0, elbow.y));
        points[13] = Some(elbow);
        points[15] = Some(Point2D::new(elbow.x + 100.0 * t.cos(), elbow.y + 100.0 * t.sin()));
        LandmarkFrame::new(points)
    }

    fn evaluated(evaluation: Evaluation) -> EvaluationResult {
        match evaluation {
            Evaluation::Evaluated(result) => result,
            Evaluation::Skipped => panic!("expected an evaluated frame"),
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let profile = single_joint_profile(170, 180);
        let mut evaluator = PostureEvaluator::new(0);

        for (angle, expected) in [(170.0, true), (169.0, false), (180.0, true), (175.2, true), (169.4, false)] {
            let result = evaluated(evaluator.evaluate(Some(&arm_frame(angle)), &profile, 0));
            assert_eq!(result.joints[0].in_range, expected, "angle {}", angle);
        }
    }

    #[test]
    fn test_upper_boundary_is_inclusive() {
        let profile = single_joint_profile(100, 120);
        let mut evaluator = PostureEvaluator::new(0);

        let at_max = evaluated(evaluator.evaluate(Some(&arm_frame(120.0)), &profile, 0));
        assert_eq!(at_max.joints[0].angle_degrees, 120);
        assert!(at_max.joints[0].in_range);

        let past_max = evaluated(evaluator.evaluate(Some(&arm_frame(121.0)), &profile, 0));
        assert!(!past_max.joints[0].in_range);
    }

    #[test]
    fn test_unreachable_upper_bound_behaves_like_open_range() {
        // Angles never exceed 180, so 190 and 191 both read as the straight arm.
        let profile = single_joint_profile(170, 190);
        let mut evaluator = PostureEvaluator::new(0);
        let result = evaluated(evaluator.evaluate(Some(&arm_frame(180.0)), &profile, 0));
        assert_eq!(result.joints[0].angle_degrees, 180);
        assert!(result.all_in_range);
    }

    #[test]
    fn test_hold_resets_until_pose_is_correct() {
        let profile = single_joint_profile(170, 190);
        let mut evaluator = PostureEvaluator::new(0);
        let wrong = arm_frame(90.0);
        let right = arm_frame(178.0);

        for t in [0, 1000, 2000, 2999] {
            let result = evaluated(evaluator.evaluate(Some(&wrong), &profile, t));
            assert!(!result.all_in_range);
            assert_eq!(result.held_seconds, 0, "t={}", t);
        }

        for t in (3000..=8000).step_by(500) {
            let result = evaluated(evaluator.evaluate(Some(&right), &profile, t));
            assert!(result.all_in_range);
            if t % 1000 == 0 {
                assert_eq!(result.held_seconds, (t - 3000) / 1000, "t={}", t);
            }
        }
    }

    #[test]
    fn test_hold_is_monotonic_then_drops_to_zero() {
        let profile = single_joint_profile(170, 190);
        let mut evaluator = PostureEvaluator::new(0);
        let mut last = 0;
        for t in (0..5000).step_by(33) {
            let held = evaluated(evaluator.evaluate(Some(&arm_frame(180.0)), &profile, t)).held_seconds;
            assert!(held >= last);
            last = held;
        }
        assert_eq!(last, 4);

        let failed = evaluated(evaluator.evaluate(Some(&arm_frame(90.0)), &profile, 5000));
        assert_eq!(failed.held_seconds, 0);
        let next = evaluated(evaluator.evaluate(Some(&arm_frame(180.0)), &profile, 5033));
        assert_eq!(next.held_seconds, 0);
        assert_eq!(evaluator.hold_state().last_reset_ms, 5000);
    }

    #[test]
    fn test_skipped_frame_leaves_clock_running() {
        let profile = single_joint_profile(170, 190);
        let mut evaluator = PostureEvaluator::new(0);
        evaluated(evaluator.evaluate(Some(&arm_frame(90.0)), &profile, 1000));
        let before = evaluated(evaluator.evaluate(Some(&arm_frame(180.0)), &profile, 3000));
        assert_eq!(before.held_seconds, 2);

        assert_eq!(evaluator.evaluate(None, &profile, 4000), Evaluation::Skipped);
        assert_eq!(
            evaluator.evaluate(Some(&LandmarkFrame::default()), &profile, 5000),
            Evaluation::Skipped
        );
        assert_eq!(evaluator.hold_state(), HoldState::new(1000));

        let after = evaluated(evaluator.evaluate(Some(&arm_frame(180.0)), &profile, 7500));
        assert_eq!(after.held_seconds, 6);
    }

    #[test]
    fn test_missing_joint_fails_frame_without_skipping() {
        let profile = builtin("trikonasana").unwrap();
        let mut points = vec![Some(Point2D::new(10.0, 10.0)); LANDMARK_COUNT];
        points[15] = None;
        let mut evaluator = PostureEvaluator::new(0);

        let result = evaluated(evaluator.evaluate(Some(&LandmarkFrame::new(points)), &profile, 2000));
        assert_eq!(result.joints.len(), 3);
        assert!(!result.joints[0].in_range);
        assert!(result.joints[0].points.is_empty());
        assert_eq!(result.joints[1].points.len(), 3);
        assert!(!result.all_in_range);
        assert_eq!(evaluator.hold_state().last_reset_ms, 2000);
    }

    #[test]
    fn test_no_visible_group_is_skipped() {
        let profile = builtin("virabhadrasana").unwrap();
        let mut points = vec![None; LANDMARK_COUNT];
        points[0] = Some(Point2D::new(320.0, 40.0));
        let mut evaluator = PostureEvaluator::new(0);
        assert_eq!(
            evaluator.evaluate(Some(&LandmarkFrame::new(points)), &profile, 1000),
            Evaluation::Skipped
        );
        assert_eq!(evaluator.hold_state().last_reset_ms, 0);
    }

    #[test]
    fn test_pose_without_joints_never_holds() {
        let profile = PoseProfile {
            id: "empty".to_string(),
            display_name: String::new(),
            joints: Vec::new(),
        };
        let points = vec![Some(Point2D::new(10.0, 10.0)); LANDMARK_COUNT];
        let mut evaluator = PostureEvaluator::new(0);

        let result = evaluated(evaluator.evaluate(Some(&LandmarkFrame::new(points)), &profile, 5000));
        assert!(result.joints.is_empty());
        assert!(!result.all_in_range);
        assert_eq!(result.held_seconds, 0);
        assert_eq!(evaluator.hold_state().last_reset_ms, 5000);
    }

    #[test]
    fn test_degenerate_limb_is_out_of_range() {
        let profile = single_joint_profile(170, 190);
        let mut points = vec![None; LANDMARK_COUNT];
        points[11] = Some(Point2D::new(5.0, 5.0));
        points[13] = Some(Point2D::new(5.0, 5.0));
        points[15] = Some(Point2D::new(50.0, 5.0));
        let mut evaluator = PostureEvaluator::new(0);

        let result = evaluated(evaluator.evaluate(Some(&LandmarkFrame::new(points)), &profile, 0));
        assert_eq!(result.joints[0].angle_degrees, 0);
        assert!(!result.all_in_range);
    }

    #[test]
    fn test_pose_with_more_joints() {
        let profile = builtin("virabhadrasana").unwrap();
        let mut points = vec![None; LANDMARK_COUNT];
        // Arms and right leg straight, left knee bent to 120 degrees
        for (a, b, c) in [(11, 13, 15), (12, 14, 16), (24, 26, 28)] {
            points[a] = Some(Point2D::new(0.0, 0.0));
            points[b] = Some(Point2D::new(50.0, 0.0));
            points[c] = Some(Point2D::new(100.0, 0.0));
        }
        let t = 120f64.to_radians();
        points[23] = Some(Point2D::new(300.0, 300.0));
        points[25] = Some(Point2D::new(400.0, 300.0));
        points[27] = Some(Point2D::new(400.0 - 100.0 * t.cos(), 300.0 + 100.0 * t.sin()));

        let mut evaluator = PostureEvaluator::new(0);
        let result = evaluated(evaluator.evaluate(Some(&LandmarkFrame::new(points)), &profile, 1500));
        let angles: Vec<i32> = result.joints.iter().map(|j| j.angle_degrees).collect();
        assert_eq!(angles, vec![180, 180, 120, 180]);
        assert!(result.all_in_range);
        assert_eq!(result.held_seconds, 1);
    }
}
