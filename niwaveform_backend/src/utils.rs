// Bit and layout helpers shared by the digital read/write paths and the waveform adapters.
use ndarray::ArrayViewMut2;

/// Order in which digital lines are laid out across the columns of a waveform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOrder {
    /// Column `j` holds line `j`.
    LsbFirst,
    /// Column `j` holds line `num_lines - 1 - j`.
    MsbFirst,
}

// Expands the low `out.len()` bits of `value` into one 0/1 byte per line, line 0 first.
pub fn port_to_lines(value: u32, out: &mut [u8]) {
    for (line, state) in out.iter_mut().enumerate() {
        *state = if line < 32 { ((value >> line) & 1) as u8 } else { 0 };
    }
}

// Packs 0/nonzero line states (line 0 first) into a port value.
pub fn lines_to_port(lines: &[u8]) -> u32 {
    lines
        .iter()
        .take(32)
        .enumerate()
        .fold(0u32, |acc, (line, &state)| acc | (u32::from(state != 0) << line))
}

/// Copies one channel's block of line states into the rows of a digital waveform.
///
/// `block` is laid out sample-major: each sample occupies `bytes_per_sample` bytes, of which the
/// first `rows.ncols()` hold the states of the channel's lines in driver order.
pub fn fill_digital_rows(block: &[u8], bytes_per_sample: usize, order: LineOrder, rows: &mut ArrayViewMut2<u8>) {
    let num_lines = rows.ncols();
    if bytes_per_sample == 0 {
        return;
    }
    for (sample, mut row) in block.chunks(bytes_per_sample).zip(rows.rows_mut()) {
        for line in 0..num_lines.min(sample.len()) {
            let column = match order {
                LineOrder::LsbFirst => line,
                LineOrder::MsbFirst => num_lines - 1 - line,
            };
            row[column] = u8::from(sample[line] != 0);
        }
    }
}

// Splits a comma-separated name list, trimming whitespace and dropping empty entries.
pub fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn port_lines_round_trip() {
        let mut lines = [0u8; 8];
        port_to_lines(0b1010_0101, &mut lines);
        assert_eq!(lines, [1, 0, 1, 0, 0, 1, 0, 1]);
        assert_eq!(lines_to_port(&lines), 0b1010_0101);
    }

    #[test]
    fn fill_rows_msb_first_reverses_columns() {
        // Two samples, 4 bytes per sample, 3 valid lines
        let block = [1, 0, 0, 9, 0, 1, 1, 9];
        let mut data = Array2::<u8>::zeros((2, 3));
        fill_digital_rows(&block, 4, LineOrder::MsbFirst, &mut data.view_mut());
        assert_eq!(data.row(0).to_vec(), vec![0, 0, 1]);
        assert_eq!(data.row(1).to_vec(), vec![1, 1, 0]);

        fill_digital_rows(&block, 4, LineOrder::LsbFirst, &mut data.view_mut());
        assert_eq!(data.row(0).to_vec(), vec![1, 0, 0]);
    }

    #[test]
    fn split_names_ignores_blanks() {
        assert_eq!(split_names("Dev1/port0/line0, Dev1/port0/line1,"), vec!["Dev1/port0/line0", "Dev1/port0/line1"]);
        assert!(split_names("").is_empty());
    }
}
