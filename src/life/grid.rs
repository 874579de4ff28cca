use serde::{Deserialize, Serialize};

/// How neighbour lookups treat cells past the edge of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Cells outside the grid count as dead
    #[default]
    Bounded,
    /// Edges wrap around to the opposite side
    Toroidal,
}

/// A square grid of dead/alive cells stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create an all-dead grid of `size` x `size` cells
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// Build a grid from text rows, `#` or `1` alive, anything else dead
    ///
    /// Rows shorter than the row count are padded with dead cells.
    ///
    /// ```rust
    /// use life_shaper::life::Grid;
    ///
    /// let grid = Grid::from_rows(&["...", "###", "..."]);
    /// assert_eq!(grid.live_count(), 3);
    /// assert!(grid.get(1, 0));
    /// ```
    pub fn from_rows(rows: &[&str]) -> Self {
        let size = rows.len();
        let mut grid = Self::new(size);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().take(size).enumerate() {
                grid.set(row, col, matches!(ch, '#' | '1'));
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells (`size²`)
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        self.cells[row * self.size + col] = alive;
    }

    /// Flip a cell by linear index. Returns `false` if the index is out of range.
    pub fn toggle_index(&mut self, index: usize) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = !*cell;
                true
            }
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Count the live 8-connected neighbours of a cell under a boundary policy
    pub fn count_neighbors(&self, row: usize, col: usize, boundary: Boundary) -> u8 {
        let n = self.size as isize;
        let mut count = 0;

        for dr in -1..=1isize {
            for dc in -1..=1isize {
                if dr == 0 && dc == 0 {
                    continue;
                }

                let mut r = row as isize + dr;
                let mut c = col as isize + dc;

                match boundary {
                    Boundary::Bounded => {
                        if r < 0 || r >= n || c < 0 || c >= n {
                            continue;
                        }
                    }
                    Boundary::Toroidal => {
                        r = r.rem_euclid(n);
                        c = c.rem_euclid(n);
                    }
                }

                if self.cells[(r * n + c) as usize] {
                    count += 1;
                }
            }
        }

        count
    }

    /// Compute the next Game of Life generation
    ///
    /// The result is built in a fresh buffer from the current cells only, so no
    /// neighbour lookup ever observes an already-updated cell.
    pub fn next_generation(&self, boundary: Boundary) -> Grid {
        let mut next = Grid::new(self.size);

        for row in 0..self.size {
            for col in 0..self.size {
                let neighbors = self.count_neighbors(row, col, boundary);
                let alive = matches!(
                    (self.get(row, col), neighbors),
                    (true, 2) | (true, 3) | (false, 3)
                );
                next.set(row, col, alive);
            }
        }

        next
    }

    /// Fraction of cells that agree with `other`, in `[0, 1]`
    ///
    /// Both grids must have the same size.
    pub fn similarity(&self, other: &Grid) -> f32 {
        debug_assert_eq!(self.size, other.size, "grid sizes must match");
        if self.cells.is_empty() {
            return 1.0;
        }

        let matching = self
            .cells
            .iter()
            .zip(&other.cells)
            .filter(|(a, b)| a == b)
            .count();

        matching as f32 / self.cells.len() as f32
    }

    /// Row-major state vector with 1.0 for alive cells and 0.0 for dead ones
    pub fn to_state_vector(&self) -> Vec<f32> {
        self.cells
            .iter()
            .map(|&alive| if alive { 1.0 } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_still_life() {
        let grid = Grid::from_rows(&[
            "......",
            "......",
            "..##..",
            "..##..",
            "......",
            "......",
        ]);

        assert_eq!(grid.next_generation(Boundary::Bounded), grid);
        assert_eq!(grid.next_generation(Boundary::Toroidal), grid);
    }

    #[test]
    fn test_blinker_has_period_two() {
        let vertical = Grid::from_rows(&[".....", "..#..", "..#..", "..#..", "....."]);
        let horizontal = Grid::from_rows(&[".....", ".....", ".###.", ".....", "....."]);

        let gen1 = vertical.next_generation(Boundary::Bounded);
        let gen2 = gen1.next_generation(Boundary::Bounded);

        assert_eq!(gen1, horizontal);
        assert_eq!(gen2, vertical);
    }

    #[test]
    fn test_neighbors_bounded_vs_toroidal() {
        let grid = Grid::from_rows(&["#...", "....", "....", "...#"]);

        // Corner (0, 0) sees (3, 3) only when wrapping
        assert_eq!(grid.count_neighbors(0, 0, Boundary::Bounded), 0);
        assert_eq!(grid.count_neighbors(0, 0, Boundary::Toroidal), 1);
        assert_eq!(grid.count_neighbors(1, 1, Boundary::Bounded), 1);
    }

    #[test]
    fn test_blinker_on_edge_depends_on_boundary() {
        // Vertical blinker hugging the left edge
        let grid = Grid::from_rows(&[".....", "#....", "#....", "#....", "....."]);

        let bounded = grid.next_generation(Boundary::Bounded);
        let toroidal = grid.next_generation(Boundary::Toroidal);

        assert_eq!(bounded.live_count(), 2);
        assert_eq!(toroidal.live_count(), 3);
        assert!(toroidal.get(2, 4));
    }

    #[test]
    fn test_lonely_cell_dies_and_birth_needs_three() {
        let grid = Grid::from_rows(&["....", ".#..", "....", "...."]);
        assert_eq!(grid.next_generation(Boundary::Bounded).live_count(), 0);

        let grid = Grid::from_rows(&["#.#.", "....", ".#..", "...."]);
        let next = grid.next_generation(Boundary::Bounded);
        assert!(next.get(1, 1));
    }

    #[test]
    fn test_toggle_index() {
        let mut grid = Grid::new(3);
        assert!(grid.toggle_index(4));
        assert!(grid.get(1, 1));
        assert!(grid.toggle_index(4));
        assert!(!grid.get(1, 1));
        assert!(!grid.toggle_index(9));
        assert_eq!(grid.live_count(), 0);
    }

    #[test]
    fn test_similarity_bounds_and_identity() {
        let a = Grid::from_rows(&["#..", ".#.", "..#"]);
        let b = Grid::from_rows(&["###", "...", "..#"]);

        assert_eq!(a.similarity(&a), 1.0);
        assert_eq!(b.similarity(&b), 1.0);

        let s = a.similarity(&b);
        assert!((0.0..=1.0).contains(&s));
        // Matches: (0,0) (1,0) (1,2) (2,0) (2,1) (2,2)
        assert!((s - 6.0 / 9.0).abs() < 1e-6);
        assert_eq!(s, b.similarity(&a));
    }

    #[test]
    fn test_similarity_invariant_under_relabeling() {
        let a = Grid::from_rows(&["#..", ".#.", "#.#"]);
        let b = Grid::from_rows(&["##.", "...", "#.."]);

        let flip = |g: &Grid| {
            let mut flipped = g.clone();
            for i in 0..flipped.area() {
                flipped.toggle_index(i);
            }
            flipped
        };

        assert_eq!(a.similarity(&b), flip(&a).similarity(&flip(&b)));
        assert_eq!(a.similarity(&flip(&a)), 0.0);
    }

    #[test]
    fn test_state_vector_is_row_major() {
        let grid = Grid::from_rows(&[".#", ".."]);
        assert_eq!(grid.to_state_vector(), vec![0.0, 1.0, 0.0, 0.0]);
    }
}
