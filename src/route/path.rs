use std::fmt::Write;

use crate::geometry::{COORD_EPS, Point};

/// Corners tighter than this render as a plain `L`.
const MIN_CORNER_RADIUS: f32 = 0.5;

/// Convert an orthogonal polyline into an SVG path with rounded corners.
/// Each bend becomes a quadratic arc whose control point is the corner and
/// whose radius is clamped to half of both adjacent segments. Collinear runs
/// collapse into a single `L`, so a straight corridor renders as one line.
pub fn rounded_path(points: &[Point], bend_radius: f32) -> String {
    let corners = collapse_collinear(points);
    if corners.is_empty() {
        return String::new();
    }

    let mut path = String::new();
    write_command(&mut path, "M", corners[0]);
    if corners.len() == 1 {
        return path;
    }

    let radius = bend_radius.max(0.0);
    for idx in 1..corners.len() - 1 {
        let prev = corners[idx - 1];
        let corner = corners[idx];
        let next = corners[idx + 1];
        let in_len = manhattan(prev, corner);
        let out_len = manhattan(corner, next);
        let r = radius.min(in_len / 2.0).min(out_len / 2.0);
        if r < MIN_CORNER_RADIUS {
            write_command(&mut path, " L", corner);
            continue;
        }
        let entry = toward(corner, prev, r);
        let exit = toward(corner, next, r);
        write_command(&mut path, " L", entry);
        write_command(&mut path, " Q", corner);
        write_command(&mut path, "", exit);
    }
    write_command(&mut path, " L", corners[corners.len() - 1]);
    path
}

/// Strip duplicates and collinear interior points so only real corners
/// remain. Simplification normally did this upstream; the renderer stays
/// defensive about stub-protected runs.
fn collapse_collinear(points: &[Point]) -> Vec<Point> {
    let mut corners: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if let Some(&last) = corners.last()
            && (last.0 - point.0).abs() <= COORD_EPS
            && (last.1 - point.1).abs() <= COORD_EPS
        {
            continue;
        }
        while corners.len() >= 2 {
            let a = corners[corners.len() - 2];
            let b = corners[corners.len() - 1];
            let straight = ((a.0 - b.0).abs() <= COORD_EPS && (b.0 - point.0).abs() <= COORD_EPS)
                || ((a.1 - b.1).abs() <= COORD_EPS && (b.1 - point.1).abs() <= COORD_EPS);
            if straight {
                corners.pop();
            } else {
                break;
            }
        }
        corners.push(point);
    }
    corners
}

fn manhattan(a: Point, b: Point) -> f32 {
    (b.0 - a.0).abs() + (b.1 - a.1).abs()
}

/// Point at distance `r` from `corner` along the segment toward `other`.
fn toward(corner: Point, other: Point, r: f32) -> Point {
    let dx = other.0 - corner.0;
    let dy = other.1 - corner.1;
    let len = dx.abs() + dy.abs();
    if len <= COORD_EPS {
        return corner;
    }
    (corner.0 + dx / len * r, corner.1 + dy / len * r)
}

fn write_command(path: &mut String, command: &str, point: Point) {
    let _ = write!(path, "{} {} {}", command, point.0, point.1);
}
