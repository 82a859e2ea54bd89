use crate::ir::NodeSpec;

/// World-space point. Host coordinates, y grows downward.
pub type Point = (f32, f32);

/// Tolerance for treating two coordinates as equal.
pub const COORD_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone)]
pub struct Rect {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn from_node(node: &NodeSpec) -> Self {
        Self {
            id: node.id.clone(),
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
        }
    }

    pub fn inflate(&self, padding: f32) -> InflatedRect {
        InflatedRect {
            left: self.x - padding,
            right: self.x + self.width + padding,
            top: self.y - padding,
            bottom: self.y + self.height + padding,
        }
    }
}

/// An obstacle grown by the routing padding. All containment and crossing
/// tests are strict, so paths may ride the inflated boundary itself.
#[derive(Debug, Clone, Copy)]
pub struct InflatedRect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl InflatedRect {
    pub fn contains_strict(&self, point: Point) -> bool {
        point.0 > self.left && point.0 < self.right && point.1 > self.top && point.1 < self.bottom
    }
}

/// Whether the vertical segment at `x` spanning `[y1, y2]` cuts through any
/// inflated rect. A rect blocks iff it strictly contains `x` and its open
/// vertical extent overlaps the segment's.
pub fn vertical_segment_blocked(x: f32, y1: f32, y2: f32, obstacles: &[InflatedRect]) -> bool {
    let (lo, hi) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
    obstacles.iter().any(|rect| {
        rect.left < x && x < rect.right && lo.max(rect.top) < hi.min(rect.bottom)
    })
}

/// Transpose of [`vertical_segment_blocked`].
pub fn horizontal_segment_blocked(y: f32, x1: f32, x2: f32, obstacles: &[InflatedRect]) -> bool {
    let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
    obstacles.iter().any(|rect| {
        rect.top < y && y < rect.bottom && lo.max(rect.left) < hi.min(rect.right)
    })
}

pub fn aligned(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() <= COORD_EPS || (a.1 - b.1).abs() <= COORD_EPS
}

fn same_point(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() <= COORD_EPS && (a.1 - b.1).abs() <= COORD_EPS
}

fn collinear(a: Point, b: Point, c: Point) -> bool {
    ((a.0 - b.0).abs() <= COORD_EPS && (b.0 - c.0).abs() <= COORD_EPS)
        || ((a.1 - b.1).abs() <= COORD_EPS && (b.1 - c.1).abs() <= COORD_EPS)
}

/// Drop exact duplicates and collinear interior points. The points at index 1
/// and len-2 are the stub endpoints and always survive, so a straight
/// corridor still yields the four-point `[port, stub, stub, port]` shape.
pub fn simplify_polyline(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if same_point(prev, curr) {
            continue;
        }
        if idx == 1 || idx == points.len() - 2 {
            out.push(curr);
            continue;
        }
        if collinear(prev, curr, points[idx + 1]) {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    if !same_point(last, out[out.len() - 1]) {
        out.push(last);
    }
    out
}

pub fn path_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|pair| (pair[1].0 - pair[0].0).abs() + (pair[1].1 - pair[0].1).abs())
        .sum()
}

pub fn bend_count(points: &[Point]) -> usize {
    if points.len() < 3 {
        return 0;
    }
    let mut bends = 0usize;
    for idx in 1..points.len() - 1 {
        if !collinear(points[idx - 1], points[idx], points[idx + 1]) {
            bends += 1;
        }
    }
    bends
}
