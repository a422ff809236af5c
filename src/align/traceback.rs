use super::result::EditOp;

/// Direction for traceback in a banded DP matrix
///
/// Rows are query positions and columns are diagonals of the band, so a
/// diagonal step keeps the column while gaps move one column sideways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracebackDir {
    /// Diagonal (match/mismatch), previous row, same column
    Diag,
    /// Up (insertion in query), previous row, next column
    Up,
    /// Left (deletion from query), same row, previous column
    Left,
    /// Stop (start of alignment)
    Stop,
}

/// Traceback matrix for storing alignment path
pub struct TracebackMatrix {
    data: Vec<TracebackDir>,
    rows: usize,
    cols: usize,
}

impl TracebackMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![TracebackDir::Stop; rows * cols],
            rows,
            cols,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> TracebackDir {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, dir: TracebackDir) {
        self.data[row * self.cols + col] = dir;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// Walk back from `(end_row, end_col)` to the first Stop cell.
///
/// `is_match(row, col)` tells whether the residues compared by a diagonal
/// step into that cell are identical. Returns the edit script in forward
/// order and the Stop cell the alignment starts after.
pub fn traceback<F>(
    matrix: &TracebackMatrix,
    end_row: usize,
    end_col: usize,
    is_match: F,
) -> (Vec<EditOp>, usize, usize)
where
    F: Fn(usize, usize) -> bool,
{
    let mut edit_script = Vec::new();
    let mut row = end_row;
    let mut col = end_col;

    loop {
        match matrix.get(row, col) {
            TracebackDir::Diag if row > 0 => {
                if is_match(row, col) {
                    edit_script.push(EditOp::Match);
                } else {
                    edit_script.push(EditOp::Mismatch);
                }
                row -= 1;
            }
            TracebackDir::Up if row > 0 && col + 1 < matrix.cols() => {
                edit_script.push(EditOp::Ins);
                row -= 1;
                col += 1;
            }
            TracebackDir::Left if col > 0 => {
                edit_script.push(EditOp::Del);
                col -= 1;
            }
            _ => break,
        }
    }

    edit_script.reverse();
    (edit_script, row, col)
}
