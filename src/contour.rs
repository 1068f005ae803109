//! Marching-squares contour tracing on a rectangular grid

use ndarray::{ArrayView1, ArrayView2};
use std::collections::{HashMap, VecDeque};

/// Polyline of a contour level
///
/// A closed line doesn't repeat its first vertex at the end.
#[derive(Clone, Debug, PartialEq)]
pub struct ContourLine {
    pub points: Vec<[f64; 2]>,
    pub closed: bool,
}

impl ContourLine {
    /// Is `p` inside the closed line? Always `false` for open lines
    pub fn contains(&self, p: [f64; 2]) -> bool {
        if !self.closed {
            return false;
        }
        let [px, py] = p;
        let n = self.points.len();
        (0..n).fold(false, |inside, i| {
            let [xi, yi] = self.points[i];
            let [xj, yj] = self.points[(i + n - 1) % n];
            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                !inside
            } else {
                inside
            }
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Grid edge crossed by a contour
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
enum Edge {
    /// Between nodes `(i, j)` and `(i, j + 1)`
    Horizontal(usize, usize),
    /// Between nodes `(i, j)` and `(i + 1, j)`
    Vertical(usize, usize),
}

/// Trace contour lines of `z` at `level`
///
/// `z[[i, j]]` is the value at `(x[j], y[i])`, i.e. rows follow `y` like a mesh grid. Nodes with
/// values below `level` are inside, NaN and infinite values are outside. Saddle cells are resolved
/// with the mean of their four corners. Lines are returned in the order their first segment
/// appears in a row-major scan of the cells.
pub fn contour_lines(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    z: ArrayView2<f64>,
    level: f64,
) -> Vec<ContourLine> {
    assert_eq!(
        z.dim(),
        (y.len(), x.len()),
        "z must have shape (y.len(), x.len())"
    );
    let (ny, nx) = z.dim();
    if nx < 2 || ny < 2 {
        return vec![];
    }
    let inside = |i: usize, j: usize| z[[i, j]] < level;

    let mut segments: Vec<[Edge; 2]> = vec![];
    for i in 0..ny - 1 {
        for j in 0..nx - 1 {
            let bottom = Edge::Horizontal(i, j);
            let right = Edge::Vertical(i, j + 1);
            let top = Edge::Horizontal(i + 1, j);
            let left = Edge::Vertical(i, j);

            let corners = [
                inside(i, j),
                inside(i, j + 1),
                inside(i + 1, j + 1),
                inside(i + 1, j),
            ];
            let crossed: Vec<_> = [bottom, right, top, left]
                .into_iter()
                .enumerate()
                .filter(|&(k, _)| corners[k] != corners[(k + 1) % 4])
                .map(|(_, edge)| edge)
                .collect();

            match crossed.len() {
                0 => {}
                2 => segments.push([crossed[0], crossed[1]]),
                _ => {
                    let center = 0.25
                        * (z[[i, j]] + z[[i, j + 1]] + z[[i + 1, j + 1]] + z[[i + 1, j]]);
                    // Cut off the corners which differ from the center
                    let cut_first = corners[0] != (center < level);
                    if cut_first {
                        segments.push([left, bottom]);
                        segments.push([right, top]);
                    } else {
                        segments.push([bottom, right]);
                        segments.push([top, left]);
                    }
                }
            }
        }
    }

    let point = |edge: Edge| -> [f64; 2] {
        let ((i0, j0), (i1, j1)) = match edge {
            Edge::Horizontal(i, j) => ((i, j), (i, j + 1)),
            Edge::Vertical(i, j) => ((i, j), (i + 1, j)),
        };
        let (v0, v1) = (z[[i0, j0]], z[[i1, j1]]);
        let t = (level - v0) / (v1 - v0);
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
        [
            x[j0] + t * (x[j1] - x[j0]),
            y[i0] + t * (y[i1] - y[i0]),
        ]
    };

    trace(&segments)
        .into_iter()
        .map(|(edges, closed)| ContourLine {
            points: edges.into_iter().map(point).collect(),
            closed,
        })
        .collect()
}

/// Join segments sharing edges into chains
fn trace(segments: &[[Edge; 2]]) -> Vec<(Vec<Edge>, bool)> {
    let mut adjacency: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (k, segment) in segments.iter().enumerate() {
        for &edge in segment {
            adjacency.entry(edge).or_default().push(k);
        }
    }

    let mut used = vec![false; segments.len()];
    let next = |used: &mut Vec<bool>, edge: Edge| -> Option<Edge> {
        let k = adjacency
            .get(&edge)?
            .iter()
            .copied()
            .find(|&k| !used[k])?;
        used[k] = true;
        let [p, q] = segments[k];
        Some(if p == edge { q } else { p })
    };

    let mut chains = vec![];
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut chain = VecDeque::from(segments[start]);

        while let Some(edge) = chain.back().and_then(|&back| next(&mut used, back)) {
            chain.push_back(edge);
        }
        let closed = chain.len() > 3 && chain.front() == chain.back();
        if closed {
            chain.pop_back();
        } else {
            while let Some(edge) = chain.front().and_then(|&front| next(&mut used, front)) {
                chain.push_front(edge);
            }
        }
        chains.push((chain.into(), closed));
    }
    chains
}
