//! Planar polygon predicates and ear-clipping triangulation.
//!
//! Orientation follows the usual y-up convention: a positive cross product of
//! `(b - a)` and `(c - a)` is a counter-clockwise turn. `is_polygon_ccw` uses
//! the shoelace sum `sum((x1 - x0) * (y1 + y0))`, which is minus twice the
//! signed area, so "sum < 0" agrees with `is_ccw`.

use glam::DVec2;

const COLLINEAR_EPSILON: f64 = f32::EPSILON as f64;

pub fn is_collinear(a: DVec2, b: DVec2, c: DVec2) -> bool {
    (b - a).perp_dot(c - a).abs() <= COLLINEAR_EPSILON
}

pub fn is_ccw(a: DVec2, b: DVec2, c: DVec2) -> bool {
    (b - a).perp_dot(c - a) > 0.0
}

/// True when `p` lies inside or on the boundary of the CCW triangle `abc`.
pub fn is_point_inside_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    !is_ccw(a, p, b) && !is_ccw(b, p, c) && !is_ccw(c, p, a)
}

pub fn is_polygon_ccw(points: &[DVec2]) -> bool {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        sum += (p1.x - p0.x) * (p1.y + p0.y);
    }
    sum < 0.0
}

/// Removes every vertex that is collinear with its two neighbours (this
/// includes repeated points). Scans the ring cyclically until every remaining
/// triple has been checked since the last removal, so a second call never
/// removes anything.
pub fn remove_collinear_points(points: &mut Vec<DVec2>) {
    let mut i = 0;
    let mut clean = 0;
    while points.len() >= 3 && clean < points.len() {
        let n = points.len();
        let a = i % n;
        let mid = (a + 1) % n;
        if is_collinear(points[a], points[mid], points[(a + 2) % n]) {
            points.remove(mid);
            clean = 0;
            // step back so the triple ending at the new neighbour is rechecked
            let n = points.len();
            let a = if mid < a { a - 1 } else { a };
            i = (a + n - 1) % n;
        } else {
            clean += 1;
            i = a + 1;
        }
    }
}

/// Strips collinear vertices and reverses the ring if needed so it winds
/// counter-clockwise. Returns false if the ring still does not report CCW
/// afterwards (zero area or self intersecting).
pub fn normalize_ring(points: &mut Vec<DVec2>) -> bool {
    remove_collinear_points(points);
    if !is_polygon_ccw(points) {
        points.reverse();
    }
    is_polygon_ccw(points)
}

/// Ear-clipping triangulation of a simple CCW polygon without collinear
/// vertices. Each ear found is appended to `out_points` as three points
/// (prev, curr, next), giving a non-indexed triangle list.
///
/// When no ear can be found before the ring is used up the triangles found so
/// far are kept and false is returned.
pub fn polygon_triangulation(points: &[DVec2], out_points: &mut Vec<DVec2>) -> bool {
    out_points.clear();
    if points.len() < 3 {
        return false;
    }

    let mut ring = points.to_vec();
    while ring.len() >= 3 {
        let n = ring.len();
        let mut ear = None;
        for curr in 0..n {
            let prev = (curr + n - 1) % n;
            let next = (curr + 1) % n;
            let (a, b, c) = (ring[prev], ring[curr], ring[next]);
            if !is_ccw(a, b, c) {
                continue;
            }
            let blocked = (0..n)
                .filter(|&j| j != prev && j != curr && j != next)
                .any(|j| is_point_inside_triangle(ring[j], a, b, c));
            if !blocked {
                ear = Some((prev, curr, next));
                break;
            }
        }

        match ear {
            Some((prev, curr, next)) => {
                out_points.push(ring[prev]);
                out_points.push(ring[curr]);
                out_points.push(ring[next]);
                ring.remove(curr);
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(f64, f64)]) -> Vec<DVec2> {
        v.iter().map(|(x, y)| DVec2::new(*x, *y)).collect()
    }

    fn triangle_area(a: DVec2, b: DVec2, c: DVec2) -> f64 {
        (b - a).perp_dot(c - a) / 2.0
    }

    fn total_area(tris: &[DVec2]) -> f64 {
        tris.chunks(3).map(|t| triangle_area(t[0], t[1], t[2])).sum()
    }

    #[test]
    fn test_predicates() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(1.0, 0.0);
        let c = DVec2::new(0.0, 1.0);
        assert!(is_ccw(a, b, c));
        assert!(!is_ccw(a, c, b));
        assert!(is_collinear(a, b, DVec2::new(5.0, 0.0)));
        assert!(!is_collinear(a, b, c));
        assert!(is_collinear(a, a, c));

        assert!(is_point_inside_triangle(DVec2::new(0.25, 0.25), a, b, c));
        assert!(is_point_inside_triangle(DVec2::new(0.5, 0.0), a, b, c));
        assert!(is_point_inside_triangle(a, a, b, c));
        assert!(!is_point_inside_triangle(DVec2::new(1.0, 1.0), a, b, c));
        assert!(!is_point_inside_triangle(DVec2::new(-0.1, 0.5), a, b, c));
    }

    #[test]
    fn test_winding_conventions_agree() {
        let square = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        assert!(is_polygon_ccw(&square));
        for i in 0..4 {
            let prev = square[(i + 3) % 4];
            let next = square[(i + 1) % 4];
            assert!(is_ccw(prev, square[i], next));
        }

        let mut cw = square.clone();
        cw.reverse();
        assert!(!is_polygon_ccw(&cw));
        cw.reverse();
        assert!(is_polygon_ccw(&cw));
    }

    #[test]
    fn test_triangulate_square() {
        let square = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let mut out = Vec::new();
        assert!(polygon_triangulation(&square, &mut out));
        assert_eq!(out.len(), 6);
        assert!((total_area(&out) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangulate_concave() {
        // L shape, area 3
        let l = pts(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ]);
        assert!(is_polygon_ccw(&l));
        let mut out = Vec::new();
        assert!(polygon_triangulation(&l, &mut out));
        assert_eq!(out.len(), 3 * 4);
        assert!((total_area(&out) - 3.0).abs() < 1e-9);
        for t in out.chunks(3) {
            assert!(is_ccw(t[0], t[1], t[2]));
        }
    }

    #[test]
    fn test_triangulate_degenerate() {
        let mut out = vec![DVec2::ZERO];
        assert!(!polygon_triangulation(&pts(&[(0.0, 0.0), (1.0, 1.0)]), &mut out));
        assert!(out.is_empty());

        // clockwise input has no CCW ear at all
        let cw = pts(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)]);
        assert!(!polygon_triangulation(&cw, &mut out));
        assert!(out.is_empty());

        // bow tie: partial output, never more than n-2 triangles
        let bowtie = pts(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        polygon_triangulation(&bowtie, &mut out);
        assert!(out.len() <= 6);
        assert_eq!(out.len() % 3, 0);
    }

    #[test]
    fn test_remove_collinear() {
        let mut ring = pts(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (4.0, 4.0),
            (2.0, 4.0),
            (0.0, 4.0),
            (0.0, 2.0),
        ]);
        remove_collinear_points(&mut ring);
        assert_eq!(ring.len(), 4);
        assert!(ring.contains(&DVec2::new(0.0, 0.0)));
        assert!(ring.contains(&DVec2::new(4.0, 0.0)));
        assert!(ring.contains(&DVec2::new(4.0, 4.0)));
        assert!(ring.contains(&DVec2::new(0.0, 4.0)));
    }

    #[test]
    fn test_remove_collinear_idempotent() {
        let rings = vec![
            pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]),
            pts(&[(1.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]),
            pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]),
            pts(&[(0.0, 0.0), (3.0, 0.0), (3.0, 1.0), (3.0, 3.0), (2.0, 3.0), (1.0, 3.0), (0.0, 3.0), (0.0, 1.5)]),
        ];
        for r in rings {
            let mut once = r.clone();
            remove_collinear_points(&mut once);
            let mut twice = once.clone();
            remove_collinear_points(&mut twice);
            assert_eq!(once, twice);
            if once.len() >= 3 {
                let n = once.len();
                for i in 0..n {
                    assert!(!is_collinear(once[i], once[(i + 1) % n], once[(i + 2) % n]));
                }
            }
        }
    }

    #[test]
    fn test_normalize_ring() {
        let mut ring = pts(&[(0.0, 0.0), (0.0, 4.0), (0.0, 5.0), (4.0, 5.0), (4.0, 0.0)]);
        assert!(normalize_ring(&mut ring));
        assert_eq!(ring.len(), 4);
        assert!(is_polygon_ccw(&ring));

        let mut flat = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(!normalize_ring(&mut flat));
    }
}
