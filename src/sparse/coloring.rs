//! Distance-2 column colouring of a Jacobian sparsity pattern.
//!
//! Two columns conflict when some row depends on both. Columns of equal colour
//! are structurally orthogonal and can share one compressed direction. All
//! functions here are pure and deterministic.

use std::collections::BTreeSet;

use crate::config::ColoringOrder;
use crate::error::{ConsistencyError, Result};
use crate::sparse::SparsityPattern;

/// Conflict graph over the columns of a pattern.
///
/// Vertex `j` is column `j`; an edge joins two columns that share a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictGraph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl ConflictGraph {
    /// Build the column conflict graph of `pattern`.
    pub fn from_pattern(pattern: &SparsityPattern) -> Self {
        let mut adjacency = vec![BTreeSet::new(); pattern.ncols()];
        for i in 0..pattern.nrows() {
            let row = pattern.row(i);
            for (k, &a) in row.iter().enumerate() {
                for &b in &row[k + 1..] {
                    adjacency[a].insert(b);
                    adjacency[b].insert(a);
                }
            }
        }
        ConflictGraph { adjacency }
    }

    /// Build directly from adjacency sets. Edges are symmetrised and self
    /// loops dropped.
    pub fn from_adjacency(mut adjacency: Vec<BTreeSet<usize>>) -> Self {
        let n = adjacency.len();
        for v in 0..n {
            adjacency[v].remove(&v);
            let neighbours: Vec<usize> = adjacency[v].iter().copied().filter(|&u| u < n).collect();
            for u in neighbours {
                adjacency[u].insert(v);
            }
            adjacency[v].retain(|&u| u < n);
        }
        ConflictGraph { adjacency }
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[v].iter().copied()
    }

    /// Vertices in the order requested by `order`.
    pub fn ordering(&self, order: ColoringOrder) -> Vec<usize> {
        match order {
            ColoringOrder::Natural => (0..self.num_vertices()).collect(),
            ColoringOrder::LargestFirst => self.largest_first_order(),
            ColoringOrder::SmallestLast => self.smallest_last_order(),
        }
    }

    /// Vertices sorted by decreasing degree; equal degrees keep index order.
    pub fn largest_first_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.num_vertices()).collect();
        order.sort_by(|&a, &b| self.degree(b).cmp(&self.degree(a)));
        order
    }

    /// Smallest-last colouring order.
    ///
    /// Repeatedly removes a vertex of minimum degree in the remaining graph
    /// (lowest index among ties) and returns the reverse of the removal
    /// sequence, i.e. the order in which vertices should be coloured.
    pub fn smallest_last_order(&self) -> Vec<usize> {
        let n = self.num_vertices();
        let mut degree: Vec<usize> = (0..n).map(|v| self.degree(v)).collect();
        let max_degree = degree.iter().copied().max().unwrap_or(0);

        // buckets[d] holds remaining vertices of current degree d.
        let mut buckets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); max_degree + 1];
        for (v, &d) in degree.iter().enumerate() {
            buckets[d].insert(v);
        }

        let mut removed = vec![false; n];
        let mut removal = Vec::with_capacity(n);
        let mut min_degree = 0;
        for _ in 0..n {
            while buckets[min_degree].is_empty() {
                min_degree += 1;
            }
            let Some(v) = buckets[min_degree].pop_first() else {
                break;
            };
            removed[v] = true;
            removal.push(v);

            for u in self.neighbors(v) {
                if removed[u] {
                    continue;
                }
                let d = degree[u];
                buckets[d].remove(&u);
                buckets[d - 1].insert(u);
                degree[u] = d - 1;
            }
            // Removing one vertex lowers neighbour degrees by at most one.
            min_degree = min_degree.saturating_sub(1);
        }

        removal.reverse();
        removal
    }

    /// Greedy colouring: visit vertices in `order`, give each the smallest
    /// colour not used by an already coloured neighbour.
    ///
    /// Vertices missing from `order` stay uncoloured.
    pub fn greedy_coloring(&self, order: &[usize]) -> Coloring {
        let n = self.num_vertices();
        let mut colors: Vec<Option<usize>> = vec![None; n];
        // forbidden[c] == v marks colour c as taken while colouring v.
        let mut forbidden: Vec<usize> = Vec::new();
        let mut num_colors = 0;

        for &v in order {
            for u in self.neighbors(v) {
                if let Some(c) = colors[u] {
                    forbidden[c] = v;
                }
            }
            let color = (0..num_colors)
                .find(|&c| forbidden[c] != v)
                .unwrap_or(num_colors);
            if color == num_colors {
                num_colors += 1;
                forbidden.push(usize::MAX);
            }
            colors[v] = Some(color);
        }

        Coloring { colors, num_colors }
    }
}

/// Column (or row) to colour assignment.
///
/// Columns without any pattern entry need no compressed lane and carry no
/// colour, so an empty pattern has zero colours.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ColoringData"))]
pub struct Coloring {
    colors: Vec<Option<usize>>,
    num_colors: usize,
}

impl Coloring {
    /// Build from an explicit assignment. `num_colors` is one past the
    /// largest colour used.
    pub fn from_colors(colors: Vec<usize>) -> Self {
        let num_colors = colors.iter().map(|&c| c + 1).max().unwrap_or(0);
        Coloring {
            colors: colors.into_iter().map(Some).collect(),
            num_colors,
        }
    }

    /// Every vertex in its own colour class.
    pub fn trivial(n: usize) -> Self {
        Coloring {
            colors: (0..n).map(Some).collect(),
            num_colors: n,
        }
    }

    /// Colour of vertex `j`, `None` if it needs no lane.
    #[inline]
    pub fn color(&self, j: usize) -> Option<usize> {
        self.colors[j]
    }

    pub fn colors(&self) -> &[Option<usize>] {
        &self.colors
    }

    /// Number of colours `p`.
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// Number of vertices covered, coloured or not.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Vertices grouped by colour, each class in increasing order.
    pub fn classes(&self) -> Vec<Vec<usize>> {
        let mut classes = vec![Vec::new(); self.num_colors];
        for (j, c) in self.colors.iter().enumerate() {
            if let Some(c) = *c {
                classes[c].push(j);
            }
        }
        classes
    }

    /// Build from an assignment with uncoloured vertices.
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::ColourOutOfRange`] if a colour is `>= num_colors`.
    pub fn from_parts(colors: Vec<Option<usize>>, num_colors: usize) -> Result<Self> {
        let coloring = Coloring { colors, num_colors };
        for (j, c) in coloring.colors.iter().enumerate() {
            if let Some(c) = *c {
                coloring.check_range(j, c)?;
            }
        }
        Ok(coloring)
    }

    fn check_range(&self, column: usize, colour: usize) -> Result<()> {
        if colour >= self.num_colors {
            return Err(ConsistencyError::ColourOutOfRange {
                column,
                colour,
                num_colors: self.num_colors,
            }
            .into());
        }
        Ok(())
    }

    /// Colour of column `j` for pattern entry `(i, j)`.
    pub(crate) fn lane(&self, i: usize, j: usize) -> Result<usize> {
        let c = self
            .colors
            .get(j)
            .copied()
            .flatten()
            .ok_or(ConsistencyError::Uncoloured { row: i, column: j })?;
        self.check_range(j, c)?;
        Ok(c)
    }

    /// Check that no row of `pattern` holds two columns of the same colour.
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::ColouringSize`] if the colouring does not cover
    /// the pattern's columns, [`ConsistencyError::Uncoloured`] for an entry in
    /// an uncoloured column, [`ConsistencyError::ColourOutOfRange`] for a
    /// colour past `num_colors`, [`ConsistencyError::ColourCollision`] on the
    /// first violating row.
    pub fn verify(&self, pattern: &SparsityPattern) -> Result<()> {
        if self.colors.len() != pattern.ncols() {
            return Err(ConsistencyError::ColouringSize {
                colouring: self.colors.len(),
                pattern: pattern.ncols(),
            }
            .into());
        }
        // owner[c] = (row + 1, column) of the last column seen with colour c.
        let mut owner = vec![(0usize, 0usize); self.num_colors];
        for i in 0..pattern.nrows() {
            for &j in pattern.row(i) {
                let c = self.lane(i, j)?;
                let (seen_row, seen_col) = owner[c];
                if seen_row == i + 1 {
                    return Err(ConsistencyError::ColourCollision {
                        row: i,
                        first: seen_col,
                        second: j,
                        colour: c,
                    }
                    .into());
                }
                owner[c] = (i + 1, j);
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ColoringData {
    colors: Vec<Option<usize>>,
    num_colors: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<ColoringData> for Coloring {
    type Error = crate::Error;

    fn try_from(data: ColoringData) -> Result<Self> {
        Coloring::from_parts(data.colors, data.num_colors)
    }
}

/// Colour the columns of `pattern` for forward (column) compression.
///
/// Columns without entries are left uncoloured.
pub fn color_columns(pattern: &SparsityPattern, order: ColoringOrder) -> Coloring {
    let graph = ConflictGraph::from_pattern(pattern);
    let mut used = vec![false; pattern.ncols()];
    for &j in pattern.col_indices() {
        used[j] = true;
    }
    let sequence: Vec<usize> = graph
        .ordering(order)
        .into_iter()
        .filter(|&j| used[j])
        .collect();
    let coloring = graph.greedy_coloring(&sequence);
    log::debug!(
        "column colouring ({order:?}): {} columns, {} conflicts, {} colours",
        graph.num_vertices(),
        graph.num_edges(),
        coloring.num_colors()
    );
    coloring
}

/// Colour the rows of `pattern` for reverse (row) compression.
pub fn color_rows(pattern: &SparsityPattern, order: ColoringOrder) -> Coloring {
    color_columns(&pattern.transpose(), order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(n: usize) -> ConflictGraph {
        let adjacency = (0..n)
            .map(|v| {
                let mut s = BTreeSet::new();
                if v > 0 {
                    s.insert(v - 1);
                }
                if v + 1 < n {
                    s.insert(v + 1);
                }
                s
            })
            .collect();
        ConflictGraph::from_adjacency(adjacency)
    }

    #[test]
    fn smallest_last_on_path() {
        // Endpoints have degree 1; vertex 0 goes first, then 1 (now degree 1)...
        let g = path_graph(4);
        let order = g.smallest_last_order();
        assert_eq!(order, vec![3, 2, 1, 0]);
        let c = g.greedy_coloring(&order);
        assert_eq!(c.num_colors(), 2);
    }

    #[test]
    fn smallest_last_breaks_ties_by_index() {
        // Star centred at 2: leaves 0, 1, 3 all have degree 1.
        let mut adjacency = vec![BTreeSet::new(); 4];
        for leaf in [0, 1, 3] {
            adjacency[2].insert(leaf);
        }
        let g = ConflictGraph::from_adjacency(adjacency);
        assert_eq!(g.degree(0), 1);
        // Removal: 0, 1, then 2 and 3 both have degree 1 -> 2.
        assert_eq!(g.smallest_last_order(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn largest_first_is_stable() {
        let g = path_graph(3);
        assert_eq!(g.largest_first_order(), vec![1, 0, 2]);
    }

    #[test]
    fn verify_reports_collision() {
        let p = SparsityPattern::from_rows(3, vec![vec![0, 2], vec![1]]).unwrap();
        let bad = Coloring::from_colors(vec![0, 0, 0]);
        assert!(bad.verify(&p).is_err());
        let good = Coloring::from_colors(vec![0, 0, 1]);
        assert!(good.verify(&p).is_ok());
        assert_eq!(good.classes(), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn verify_rejects_colour_past_count() {
        let p = SparsityPattern::identity(2);
        let c = Coloring {
            colors: vec![Some(0), Some(5)],
            num_colors: 1,
        };
        assert_eq!(
            c.verify(&p).unwrap_err(),
            crate::Error::Consistency(ConsistencyError::ColourOutOfRange {
                column: 1,
                colour: 5,
                num_colors: 1,
            })
        );
        assert!(Coloring::from_parts(vec![Some(0), Some(5)], 1).is_err());
        assert!(Coloring::from_parts(vec![Some(0), None], 1).is_ok());
    }

    #[test]
    fn empty_columns_stay_uncoloured() {
        let p = SparsityPattern::from_rows(3, vec![vec![0], vec![0]]).unwrap();
        let c = color_columns(&p, ColoringOrder::SmallestLast);
        assert_eq!(c.colors(), &[Some(0), None, None]);
        assert_eq!(c.num_colors(), 1);

        let none = color_columns(&SparsityPattern::empty(0, 4), ColoringOrder::SmallestLast);
        assert_eq!(none.num_colors(), 0);
        assert_eq!(none.len(), 4);
    }
}
