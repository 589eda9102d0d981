// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector geometry: segment crossing, directions and circular angle intervals

use crate::types::Point2D;

const GEOM_EPS: f64 = 1e-9;

/// Sign of the turn p → q → r: `1` counter-clockwise in math axes, `-1`
/// clockwise, `0` collinear
fn orientation(p: &Point2D, q: &Point2D, r: &Point2D) -> i8 {
    let cross = (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
    if cross.abs() <= GEOM_EPS {
        0
    } else if cross > 0.0 {
        1
    } else {
        -1
    }
}

/// Proper intersection test for segments `p1q1` and `p2q2`
///
/// Segments cross when their interiors meet at a single point with strictly
/// opposite orientations on both sides, or when they are collinear and share
/// a stretch of positive length. Sharing an endpoint or a T-contact does not
/// count, so outline edges meeting at a corner never conflict.
pub fn segments_cross(p1: &Point2D, q1: &Point2D, p2: &Point2D, q2: &Point2D) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }

    if o1 == 0 && o2 == 0 && o3 == 0 && o4 == 0 {
        return collinear_overlap(p1, q1, p2, q2) > GEOM_EPS;
    }

    false
}

/// Closed intersection test for segments `p1q1` and `p2q2`
///
/// Unlike [`segments_cross`], touching counts: a shared endpoint, one
/// segment's end lying on the other, or any collinear contact. A ray passing
/// exactly through an outline vertex hits both edges that meet there.
pub fn segments_touch(p1: &Point2D, q1: &Point2D, p2: &Point2D, q2: &Point2D) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && within_box(p2, p1, q1))
        || (o2 == 0 && within_box(q2, p1, q1))
        || (o3 == 0 && within_box(p1, p2, q2))
        || (o4 == 0 && within_box(q1, p2, q2))
}

/// Whether `r` lies in the bounding box of `p` and `q`
fn within_box(r: &Point2D, p: &Point2D, q: &Point2D) -> bool {
    r.x >= p.x.min(q.x) - GEOM_EPS
        && r.x <= p.x.max(q.x) + GEOM_EPS
        && r.y >= p.y.min(q.y) - GEOM_EPS
        && r.y <= p.y.max(q.y) + GEOM_EPS
}

/// Length of the shared stretch of two collinear segments
fn collinear_overlap(p1: &Point2D, q1: &Point2D, p2: &Point2D, q2: &Point2D) -> f64 {
    // Project onto the longer segment's direction
    let (a, b) = if p1.distance_to(q1) >= p2.distance_to(q2) {
        (p1, q1)
    } else {
        (p2, q2)
    };
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < GEOM_EPS {
        return 0.0;
    }
    let project = |p: &Point2D| ((p.x - a.x) * dx + (p.y - a.y) * dy) / length;

    let (s1, e1) = min_max(project(p1), project(q1));
    let (s2, e2) = min_max(project(p2), project(q2));
    (e1.min(e2) - s1.max(s2)).max(0.0)
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Clockwise direction from `from` toward `to` in degrees, in `[0, 360)`
///
/// Image axes: 0° points along +x, 90° along +y (down the image).
/// Coincident points have no direction.
pub fn direction_degrees(from: &Point2D, to: &Point2D) -> Option<f64> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.hypot(dy) < GEOM_EPS {
        return None;
    }
    Some(normalize_degrees(dy.atan2(dx).to_degrees()))
}

/// Wrap any angle into `[0, 360)`
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Whether `n` lies on the clockwise arc from `lo` to `hi`, inclusive
///
/// All three angles are taken modulo 360, so `in_between(20.0, 310.0, 30.0)`
/// holds across the 0/360 seam. Equal bounds describe the full circle, so
/// `in_between(n, a, a)` holds for every `n`.
pub fn in_between(n: f64, lo: f64, hi: f64) -> bool {
    let n = normalize_degrees(n);
    let lo = normalize_degrees(lo);
    let hi = normalize_degrees(hi);
    if lo < hi {
        lo <= n && n <= hi
    } else {
        lo <= n || n <= hi
    }
}

/// Whether `angle` lies within `tolerance` degrees of `center`
pub fn within_tolerance(angle: f64, center: f64, tolerance: f64) -> bool {
    if tolerance >= 180.0 {
        return true;
    }
    if tolerance <= 0.0 {
        return angular_distance(angle, center) <= GEOM_EPS;
    }
    in_between(angle, center - tolerance, center + tolerance)
}

/// Smallest absolute difference between two angles in degrees, in `[0, 180]`
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    diff.min(360.0 - diff)
}

/// Point reached from `origin` after `length` pixels along `angle` degrees
pub fn ray_end(origin: &Point2D, angle: f64, length: f64) -> Point2D {
    let rad = angle.to_radians();
    Point2D::new(origin.x + rad.cos() * length, origin.y + rad.sin() * length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_in_between_cases() {
        assert!(in_between(355.0, 350.0, 10.0));
        assert!(in_between(10.0, 0.0, 10.0));
        assert!(in_between(0.0, 0.0, 10.0));
        assert!(!in_between(50.0, 20.0, 30.0));
        assert!(in_between(20.0, 310.0, 30.0));
    }

    #[test]
    fn test_in_between_equal_bounds_is_full_circle() {
        assert!(in_between(10.0, 10.0, 10.0));
        assert!(in_between(190.0, 10.0, 10.0));
        assert!(in_between(5.0, 370.0, 10.0));
    }

    #[test]
    fn test_within_tolerance_wraps() {
        assert!(within_tolerance(358.0, 2.0, 5.0));
        assert!(within_tolerance(2.0, 358.0, 5.0));
        assert!(!within_tolerance(90.0, 0.0, 10.0));
        assert!(within_tolerance(45.0, 45.0, 0.0));
        assert!(!within_tolerance(46.0, 45.0, 0.0));
    }

    #[test]
    fn test_direction_axes() {
        let o = p(10.0, 10.0);
        assert_relative_eq!(direction_degrees(&o, &p(20.0, 10.0)).unwrap(), 0.0);
        assert_relative_eq!(direction_degrees(&o, &p(10.0, 20.0)).unwrap(), 90.0);
        assert_relative_eq!(direction_degrees(&o, &p(0.0, 10.0)).unwrap(), 180.0);
        assert_relative_eq!(direction_degrees(&o, &p(10.0, 0.0)).unwrap(), 270.0);
    }

    #[test]
    fn test_direction_reverse_differs_by_180() {
        let pairs = [
            (p(0.0, 0.0), p(3.0, 4.0)),
            (p(12.5, -3.0), p(-7.0, 1.25)),
            (p(100.0, 100.0), p(100.0, 40.0)),
            (p(5.0, 5.0), p(4.0, 5.0)),
        ];
        for (a, b) in pairs {
            let ab = direction_degrees(&a, &b).unwrap();
            let ba = direction_degrees(&b, &a).unwrap();
            let diff = normalize_degrees(ab - ba);
            assert_relative_eq!(diff, 180.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_direction_degenerate() {
        assert!(direction_degrees(&p(1.0, 1.0), &p(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_segments_cross_diagonals() {
        assert!(segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 10.0),
            &p(0.0, 10.0),
            &p(10.0, 0.0)
        ));
    }

    #[test]
    fn test_shared_endpoint_is_not_crossing() {
        assert!(!segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(10.0, 0.0),
            &p(10.0, 10.0)
        ));
        // Diagonal and side of a square meet only at a corner
        assert!(!segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 10.0),
            &p(0.0, 0.0),
            &p(10.0, 0.0)
        ));
    }

    #[test]
    fn test_t_contact_is_not_crossing() {
        assert!(!segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(5.0, 0.0),
            &p(5.0, 8.0)
        ));
    }

    #[test]
    fn test_collinear_overlap() {
        assert!(segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(5.0, 0.0),
            &p(15.0, 0.0)
        ));
        // Touching end to end
        assert!(!segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(10.0, 0.0),
            &p(15.0, 0.0)
        ));
        // Parallel, disjoint
        assert!(!segments_cross(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(0.0, 1.0),
            &p(10.0, 1.0)
        ));
    }

    #[test]
    fn test_degenerate_segment_never_crosses() {
        assert!(!segments_cross(
            &p(5.0, 0.0),
            &p(5.0, 0.0),
            &p(0.0, 0.0),
            &p(10.0, 0.0)
        ));
    }

    #[test]
    fn test_segments_touch_counts_contacts() {
        // Ray along y = 104 through the vertex shared by two outline edges
        let start = p(45.0, 104.0);
        let end = p(1045.0, 104.0);
        assert!(segments_touch(&start, &end, &p(200.0, 40.0), &p(230.0, 104.0)));
        assert!(segments_touch(&start, &end, &p(230.0, 104.0), &p(200.0, 200.0)));
        assert!(!segments_cross(&start, &end, &p(200.0, 40.0), &p(230.0, 104.0)));

        // T contact and collinear end-to-end contact
        assert!(segments_touch(&p(0.0, 0.0), &p(10.0, 0.0), &p(5.0, 0.0), &p(5.0, 8.0)));
        assert!(segments_touch(&p(0.0, 0.0), &p(10.0, 0.0), &p(10.0, 0.0), &p(15.0, 0.0)));
        // Proper crossing still counts
        assert!(segments_touch(&p(0.0, 0.0), &p(10.0, 10.0), &p(0.0, 10.0), &p(10.0, 0.0)));
    }

    #[test]
    fn test_segments_touch_misses() {
        // Collinear but disjoint
        assert!(!segments_touch(&p(0.0, 0.0), &p(10.0, 0.0), &p(11.0, 0.0), &p(15.0, 0.0)));
        // Parallel
        assert!(!segments_touch(&p(0.0, 0.0), &p(10.0, 0.0), &p(0.0, 1.0), &p(10.0, 1.0)));
        // Line would pass the vertex, segment stops short
        assert!(!segments_touch(&p(0.0, 0.0), &p(4.0, 0.0), &p(5.0, 0.0), &p(5.0, 8.0)));
    }

    #[test]
    fn test_ray_end() {
        let end = ray_end(&p(1.0, 1.0), 90.0, 10.0);
        assert_relative_eq!(end.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(end.y, 11.0, epsilon = 1e-9);
    }
}
