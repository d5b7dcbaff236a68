// Curve follower for one hop of a terrain path.
//
// A `PathSegment` turns "walk from here, currently facing this way, to that
// waypoint, and leave facing roughly that way" into a cubic Bézier curve.
// Control points sit one third of the chord length along the start and end
// tangents. A tangent that would swing the curve through more than 135° is
// reversed; the worker then turns on the spot instead of tracing a loop.
//
// Movement is measured in distance, not curve parameter. At construction the
// curve is sampled at 10 evenly spaced parameters and the cumulative chord
// lengths are stored; `advance` maps the distance travelled so far through
// that table to a parameter by linear interpolation. Position is a pure
// function of total distance travelled, so advancing by `a` then `b` lands
// on the same point as advancing by `a + b`.
//
// See also: `path.rs` for `TerrainPath`, which builds segments lazily and
// chains leftover distance into the next one.

use crate::types::Vec2;

/// Number of arclength samples along the curve.
const SAMPLES: usize = 10;

/// cos(135°). Tangents more opposed to the chord than this are reversed.
const MAX_TURN_COS: f32 = -std::f32::consts::FRAC_1_SQRT_2;

/// Result of advancing along a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentStep {
    pub position: Vec2,
    /// Unit facing direction at `position`.
    pub direction: Vec2,
    /// Distance that did not fit on this segment.
    pub leftover: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    points: [Vec2; 4],
    end_direction: Vec2,
    chord_direction: Vec2,
    /// Cumulative length at each sample; `lengths[SAMPLES]` is the total.
    lengths: [f32; SAMPLES + 1],
    travelled: f32,
}

impl PathSegment {
    /// Build the curve from `start` (facing `start_direction`) to `end`,
    /// arriving along `end_hint`. Zero-length hints fall back to the chord.
    pub fn new(start: Vec2, start_direction: Vec2, end: Vec2, end_hint: Vec2) -> Self {
        let chord = end - start;
        let chord_len = chord.length();
        let chord_direction = chord.normalize_or(start_direction.normalize_or(Vec2::new(1.0, 0.0)));

        let start_tangent =
            limit_turn(start_direction.normalize_or(chord_direction), chord_direction);
        let end_tangent = limit_turn(end_hint.normalize_or(chord_direction), chord_direction);

        let handle = chord_len / 3.0;
        let points = [
            start,
            start + start_tangent * handle,
            end - end_tangent * handle,
            end,
        ];

        let mut lengths = [0.0; SAMPLES + 1];
        let mut prev = start;
        for (i, slot) in lengths.iter_mut().enumerate().skip(1) {
            let p = bezier(&points, i as f32 / SAMPLES as f32);
            *slot = p.distance(prev);
            prev = p;
        }
        for i in 1..=SAMPLES {
            lengths[i] += lengths[i - 1];
        }

        Self {
            points,
            end_direction: end_tangent,
            chord_direction,
            lengths,
            travelled: 0.0,
        }
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    pub fn end(&self) -> Vec2 {
        self.points[3]
    }

    /// Approximate arclength of the whole curve.
    pub fn length(&self) -> f32 {
        self.lengths[SAMPLES]
    }

    pub fn remaining(&self) -> f32 {
        (self.length() - self.travelled).max(0.0)
    }

    pub fn is_finished(&self) -> bool {
        self.travelled >= self.length()
    }

    /// Move up to `distance` further along the curve.
    pub fn advance(&mut self, distance: f32) -> SegmentStep {
        let total = self.length();
        let target = self.travelled + distance.max(0.0);
        if target >= total {
            self.travelled = total;
            return SegmentStep {
                position: self.end(),
                direction: self.end_direction,
                leftover: target - total,
            };
        }
        self.travelled = target;
        let t = self.parameter_at(target);
        SegmentStep {
            position: bezier(&self.points, t),
            direction: bezier_tangent(&self.points, t).normalize_or(self.chord_direction),
            leftover: 0.0,
        }
    }

    /// Curve parameter at a travelled distance, via the arclength table.
    fn parameter_at(&self, distance: f32) -> f32 {
        for i in 0..SAMPLES {
            let (lo, hi) = (self.lengths[i], self.lengths[i + 1]);
            if distance <= hi {
                let span = hi - lo;
                let frac = if span > 0.0 { (distance - lo) / span } else { 0.0 };
                return (i as f32 + frac) / SAMPLES as f32;
            }
        }
        1.0
    }
}

fn limit_turn(tangent: Vec2, chord_direction: Vec2) -> Vec2 {
    if tangent.dot(chord_direction) < MAX_TURN_COS {
        -tangent
    } else {
        tangent
    }
}

fn bezier(p: &[Vec2; 4], t: f32) -> Vec2 {
    let u = 1.0 - t;
    p[0] * (u * u * u) + p[1] * (3.0 * u * u * t) + p[2] * (3.0 * u * t * t) + p[3] * (t * t * t)
}

fn bezier_tangent(p: &[Vec2; 4], t: f32) -> Vec2 {
    let u = 1.0 - t;
    (p[1] - p[0]) * (3.0 * u * u) + (p[2] - p[1]) * (6.0 * u * t) + (p[3] - p[2]) * (3.0 * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn straight_segment_has_chord_length() {
        let seg = PathSegment::new(
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert!((seg.length() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn advance_reports_leftover_past_the_end() {
        let mut seg =
            PathSegment::new(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(10.0, 0.0), Vec2::ZERO);
        let step = seg.advance(14.0);
        assert!(close(step.position, Vec2::new(10.0, 0.0)));
        assert!((step.leftover - 4.0).abs() < 1e-3);
        assert!(seg.is_finished());
    }

    #[test]
    fn split_advances_match_single_advance() {
        let start_dir = Vec2::new(0.0, 1.0);
        let end = Vec2::new(20.0, 15.0);
        let mut a = PathSegment::new(Vec2::ZERO, start_dir, end, Vec2::new(1.0, 0.0));
        let mut b = a.clone();
        for _ in 0..4 {
            a.advance(3.0);
        }
        let single = b.advance(12.0);
        let split = a.advance(0.0);
        assert!(close(single.position, split.position));
    }

    #[test]
    fn curved_segment_bends_toward_start_heading() {
        // Facing north while the waypoint is due east: the first bit of
        // movement goes north-east, not straight east.
        let mut seg = PathSegment::new(
            Vec2::ZERO,
            Vec2::new(0.0, -1.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        let step = seg.advance(2.0);
        assert!(step.position.y < 0.0);
        assert!(seg.length() > 30.0);
    }

    #[test]
    fn reversal_turns_in_place_instead_of_looping() {
        // Facing directly away from the waypoint: the tangent is flipped and
        // the curve degenerates to the straight chord.
        let seg = PathSegment::new(
            Vec2::ZERO,
            Vec2::new(-1.0, 0.0),
            Vec2::new(30.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert!((seg.length() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn zero_length_segment_finishes_immediately() {
        let p = Vec2::new(5.0, 5.0);
        let mut seg = PathSegment::new(p, Vec2::new(1.0, 0.0), p, Vec2::ZERO);
        let step = seg.advance(3.0);
        assert_eq!(step.position, p);
        assert!((step.leftover - 3.0).abs() < 1e-6);
        assert!((step.direction.length() - 1.0).abs() < 1e-6);
    }
}
