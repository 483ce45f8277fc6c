//! Packed one-bit-per-pixel image.

/// `dim × dim` bits, row-major, each row padded to whole bytes, most significant
/// bit first. A set bit marks a point of the set.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    dim: usize,
    width_bytes: usize,
    bytes: Vec<u8>,
}

impl Bitmap {
    pub fn new(dim: usize) -> Self {
        let width_bytes = Self::width_bytes_for(dim);
        Self {
            dim,
            width_bytes,
            bytes: vec![0; width_bytes * dim],
        }
    }

    pub fn width_bytes_for(dim: usize) -> usize {
        dim.div_ceil(8)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn width_bytes(&self) -> usize {
        self.width_bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.bytes[row * self.width_bytes..(row + 1) * self.width_bytes]
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(col < self.dim);
        self.row(row)[col / 8] & (0x80 >> (col % 8)) != 0
    }

    pub fn set(&mut self, row: usize, col: usize) {
        debug_assert!(col < self.dim);
        set_bit(&mut self.bytes[row * self.width_bytes..], col);
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Disjoint mutable bands of `rows` image rows each, tagged with their first row.
    pub fn bands_mut(&mut self, rows: usize) -> impl Iterator<Item = RowBand<'_>> {
        let width_bytes = self.width_bytes;
        self.bytes
            .chunks_mut(width_bytes * rows)
            .enumerate()
            .map(move |(i, bytes)| RowBand::new(i * rows, width_bytes, bytes))
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Bitmap {}x{}", self.dim, self.dim)?;
        for row in 0..self.dim {
            let line: String = (0..self.dim)
                .map(|col| if self.get(row, col) { '#' } else { '.' })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Consecutive rows of a [`Bitmap`], owned by one worker while it renders them.
pub struct RowBand<'a> {
    pub first_row: usize,
    width_bytes: usize,
    bytes: &'a mut [u8],
}

impl<'a> RowBand<'a> {
    pub(crate) fn new(first_row: usize, width_bytes: usize, bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.len() % width_bytes, 0);
        Self {
            first_row,
            width_bytes,
            bytes,
        }
    }

    pub fn rows(&self) -> usize {
        self.bytes.len() / self.width_bytes
    }

    /// Writes the low `count` bits of `mask` (bit `i` → column `col + i`).
    pub fn write_bits(&mut self, row: usize, col: usize, mask: u64, count: usize) {
        let line = &mut self.bytes[row * self.width_bytes..(row + 1) * self.width_bytes];
        if col % 8 == 0 && count == 8 {
            line[col / 8] = (mask as u8).reverse_bits();
            return;
        }
        for i in (0..count).filter(|i| (mask >> i) & 1 == 1) {
            set_bit(line, col + i);
        }
    }
}

fn set_bit(line: &mut [u8], col: usize) {
    line[col / 8] |= 0x80 >> (col % 8);
}
