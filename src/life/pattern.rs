//! Catalog of target patterns the agent learns to build
//!
//! Each pattern is a small square stamp drawn with `#` for live cells. A
//! pattern is centred into an N×N target grid at offset `(N - size) / 2` on
//! both axes.

use super::grid::Grid;

/// A named square pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub rows: &'static [&'static str],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "block",
        rows: &[
            ".....",
            ".##..",
            ".##..",
            ".....",
            ".....",
        ],
    },
    Pattern {
        name: "blinker",
        rows: &[
            ".....",
            "..#..",
            "..#..",
            "..#..",
            ".....",
        ],
    },
    Pattern {
        name: "glider",
        rows: &[
            ".....",
            "..#..",
            "...#.",
            ".###.",
            ".....",
        ],
    },
    Pattern {
        name: "toad",
        rows: &[
            "......",
            "......",
            "..###.",
            ".###..",
            "......",
            "......",
        ],
    },
    Pattern {
        name: "beacon",
        rows: &[
            "......",
            ".##...",
            ".##...",
            "...##.",
            "...##.",
            "......",
        ],
    },
];

impl Pattern {
    /// Look up a pattern by name, ignoring case
    pub fn by_name(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Names of every pattern in the catalog
    pub fn names() -> impl Iterator<Item = &'static str> {
        PATTERNS.iter().map(|p| p.name)
    }

    /// Side length of the stamp
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Stamp coordinates of the live cells
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, line)| {
            line.chars()
                .enumerate()
                .filter(|&(_, ch)| ch == '#')
                .map(move |(col, _)| (row, col))
        })
    }

    /// Offset at which the stamp sits inside a grid of `grid_size`
    pub fn offset(&self, grid_size: usize) -> usize {
        grid_size.saturating_sub(self.size()) / 2
    }

    /// Build an all-dead `grid_size` grid with this pattern centred in it
    ///
    /// Cells of the stamp that would fall outside a too-small grid are dropped.
    pub fn centered(&self, grid_size: usize) -> Grid {
        let mut grid = Grid::new(grid_size);
        let offset = self.offset(grid_size);

        for (row, col) in self.live_cells() {
            let (r, c) = (row + offset, col + offset);
            if r < grid_size && c < grid_size {
                grid.set(r, c, true);
            }
        }

        grid
    }
}
