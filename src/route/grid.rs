use crate::geometry::{
    Axis, COORD_EPS, InflatedRect, Point, horizontal_segment_blocked, vertical_segment_blocked,
};

#[derive(Debug, Clone, Copy)]
pub(super) struct GridEdge {
    pub(super) to: usize,
    pub(super) len: f32,
    pub(super) axis: Axis,
}

/// Sparse orthogonal visibility graph for one edge: the guide lines are the
/// stub-endpoint coordinates plus every inflated obstacle boundary, waypoints
/// are the guide intersections outside all obstacles, and adjacency connects
/// consecutive waypoints on a shared guide line when the segment between them
/// clears every obstacle.
#[derive(Debug)]
pub(super) struct VisibilityGrid {
    pub(super) points: Vec<Point>,
    pub(super) adjacency: Vec<Vec<GridEdge>>,
    pub(super) source: usize,
    pub(super) target: usize,
}

impl VisibilityGrid {
    /// Returns `None` when either stub endpoint sits strictly inside an
    /// obstacle; the caller falls back to the S-shape route.
    pub(super) fn build(
        stub_src: Point,
        stub_tgt: Point,
        obstacles: &[InflatedRect],
    ) -> Option<Self> {
        let xs = guide_coords(
            [stub_src.0, stub_tgt.0],
            obstacles.iter().flat_map(|rect| [rect.left, rect.right]),
        );
        let ys = guide_coords(
            [stub_src.1, stub_tgt.1],
            obstacles.iter().flat_map(|rect| [rect.top, rect.bottom]),
        );

        // Waypoints in (x, y) lexicographic order; the index map is dense in
        // guide space so column/row walks stay cheap.
        let mut points = Vec::with_capacity(xs.len() * ys.len());
        let mut index = vec![vec![None; ys.len()]; xs.len()];
        for (xi, &x) in xs.iter().enumerate() {
            for (yi, &y) in ys.iter().enumerate() {
                if obstacles.iter().any(|rect| rect.contains_strict((x, y))) {
                    continue;
                }
                index[xi][yi] = Some(points.len());
                points.push((x, y));
            }
        }

        let source = coord_index(&xs, stub_src.0)
            .zip(coord_index(&ys, stub_src.1))
            .and_then(|(xi, yi)| index[xi][yi])?;
        let target = coord_index(&xs, stub_tgt.0)
            .zip(coord_index(&ys, stub_tgt.1))
            .and_then(|(xi, yi)| index[xi][yi])?;

        let mut adjacency: Vec<Vec<GridEdge>> = vec![Vec::new(); points.len()];
        let mut connect = |a: usize, b: usize, len: f32, axis: Axis| {
            adjacency[a].push(GridEdge { to: b, len, axis });
            adjacency[b].push(GridEdge { to: a, len, axis });
        };

        for (xi, &x) in xs.iter().enumerate() {
            let mut previous: Option<(usize, f32)> = None;
            for (yi, &y) in ys.iter().enumerate() {
                let Some(here) = index[xi][yi] else { continue };
                if let Some((prev, prev_y)) = previous
                    && !vertical_segment_blocked(x, prev_y, y, obstacles)
                {
                    connect(prev, here, y - prev_y, Axis::Vertical);
                }
                previous = Some((here, y));
            }
        }

        for (yi, &y) in ys.iter().enumerate() {
            let mut previous: Option<(usize, f32)> = None;
            for (xi, &x) in xs.iter().enumerate() {
                let Some(here) = index[xi][yi] else { continue };
                if let Some((prev, prev_x)) = previous
                    && !horizontal_segment_blocked(y, prev_x, x, obstacles)
                {
                    connect(prev, here, x - prev_x, Axis::Horizontal);
                }
                previous = Some((here, x));
            }
        }

        Some(Self {
            points,
            adjacency,
            source,
            target,
        })
    }
}

fn guide_coords(
    endpoints: [f32; 2],
    boundaries: impl IntoIterator<Item = f32>,
) -> Vec<f32> {
    let mut coords: Vec<f32> = endpoints.into_iter().chain(boundaries).collect();
    coords.sort_by(f32::total_cmp);
    coords.dedup_by(|a, b| (*a - *b).abs() <= COORD_EPS);
    coords
}

fn coord_index(coords: &[f32], value: f32) -> Option<usize> {
    coords
        .iter()
        .position(|&coord| (coord - value).abs() <= COORD_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn inflated(x: f32, y: f32, w: f32, h: f32, pad: f32) -> InflatedRect {
        Rect {
            id: String::new(),
            x,
            y,
            width: w,
            height: h,
        }
        .inflate(pad)
    }

    #[test]
    fn clear_corridor_connects_stubs_directly() {
        let grid = VisibilityGrid::build((50.0, 60.0), (50.0, 180.0), &[]).unwrap();
        assert_eq!(grid.points.len(), 2);
        assert!(
            grid.adjacency[grid.source]
                .iter()
                .any(|edge| edge.to == grid.target && edge.axis == Axis::Vertical)
        );
    }

    #[test]
    fn waypoints_never_land_inside_obstacles() {
        let obstacle = inflated(25.0, 80.0, 50.0, 50.0, 20.0);
        let grid = VisibilityGrid::build((50.0, 60.0), (50.0, 180.0), &[obstacle]).unwrap();
        for &point in &grid.points {
            assert!(!obstacle.contains_strict(point), "waypoint {point:?} inside obstacle");
        }
    }

    #[test]
    fn blocked_column_is_not_connected() {
        // Obstacle straddles the straight corridor; the two stub waypoints
        // share a column but must not get a direct vertical edge.
        let obstacle = inflated(25.0, 80.0, 50.0, 50.0, 20.0);
        let grid = VisibilityGrid::build((50.0, 60.0), (50.0, 180.0), &[obstacle]).unwrap();
        let direct = grid.adjacency[grid.source]
            .iter()
            .any(|edge| edge.to == grid.target);
        assert!(!direct);
    }

    #[test]
    fn stub_inside_obstacle_aborts_grid_construction() {
        let obstacle = inflated(0.0, 0.0, 100.0, 100.0, 20.0);
        assert!(VisibilityGrid::build((50.0, 50.0), (300.0, 300.0), &[obstacle]).is_none());
    }
}
