//! Small deterministic grid worlds with integer states and moves.
//!
//! States are cell indices `row * ncol + col`. Actions are 0 left, 1 down,
//! 2 right, 3 up; moving into a wall leaves the agent where it is.

pub mod cliff_walking;
pub mod frozen_lake;

use ndarray::Array2;

use crate::common::errors::{GymError, Result};

pub const LEFT: usize = 0;
pub const DOWN: usize = 1;
pub const RIGHT: usize = 2;
pub const UP: usize = 3;

pub(crate) fn grid_move(state: usize, action: usize, nrow: usize, ncol: usize) -> usize {
    let (mut row, mut col) = (state / ncol, state % ncol);
    match action {
        LEFT => col = col.saturating_sub(1),
        DOWN => row = (row + 1).min(nrow - 1),
        RIGHT => col = (col + 1).min(ncol - 1),
        UP => row = row.saturating_sub(1),
        _ => {}
    }

    row * ncol + col
}

/// Parses rows of cell letters into a grid. Rows must be non-empty and of equal
/// length.
pub(crate) fn parse_grid(rows: &[String]) -> Result<Array2<u8>> {
    let ncol = rows.first().map(|r| r.len()).unwrap_or(0);
    if ncol == 0 {
        return Err(GymError::InvalidConfig("grid map has no cells".into()));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != ncol) {
        return Err(GymError::InvalidConfig(format!(
            "grid row '{bad}' is not {ncol} cells wide"
        )));
    }

    let cells = rows.iter().flat_map(|r| r.bytes()).collect();
    Ok(Array2::from_shape_vec((rows.len(), ncol), cells)?)
}

/// One line per grid row, with the agent drawn as `A`.
pub(crate) fn grid_lines(agent: usize, ncol: usize, cells: impl Iterator<Item = char>) -> Vec<String> {
    let chars: Vec<char> = cells
        .enumerate()
        .map(|(i, c)| if i == agent { 'A' } else { c })
        .collect();

    chars
        .chunks(ncol)
        .map(|row| {
            row.iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::{grid_lines, grid_move, parse_grid, DOWN, LEFT, RIGHT, UP};

    #[test]
    fn test_walls_block_moves() {
        assert_eq!(grid_move(0, LEFT, 4, 4), 0);
        assert_eq!(grid_move(0, UP, 4, 4), 0);
        assert_eq!(grid_move(15, RIGHT, 4, 4), 15);
        assert_eq!(grid_move(15, DOWN, 4, 4), 15);
        assert_eq!(grid_move(5, DOWN, 4, 4), 9);
        assert_eq!(grid_move(5, RIGHT, 4, 12), 6);
    }

    #[test]
    fn test_parse_grid() {
        let grid = parse_grid(&["SF".to_string(), "HG".to_string()]).unwrap();
        assert_eq!(grid.dim(), (2, 2));
        assert_eq!(grid[(1, 0)], b'H');

        assert!(parse_grid(&["SFF".to_string(), "HG".to_string()]).is_err());
        assert!(parse_grid(&[]).is_err());
    }

    #[test]
    fn test_grid_lines() {
        let lines = grid_lines(1, 2, "SFHG".chars());
        assert_eq!(lines, vec!["S A", "H G"]);
    }
}
