//! Scanline run-length codec.
//!
//! A row is stored as `(count, value)` byte pairs. Runs longer than
//! [`MAX_RUN`] are split into several pairs with the same value; the split is
//! greedy, left to right.

use bytes::{BufMut, BytesMut};

/// Longest run a single pair can describe.
pub const MAX_RUN: usize = u8::MAX as usize;

/// Append the run-length encoding of `row` to `dst`; returns bytes appended.
pub fn encode_row(row: &[u8], dst: &mut BytesMut) -> usize {
    let start = dst.len();
    let mut rest = row;
    while let Some(&value) = rest.first() {
        let run = run_len(rest, value);
        dst.reserve(2);
        dst.put_u8(run as u8);
        dst.put_u8(value);
        rest = &rest[run..];
    }
    dst.len() - start
}

/// Run-length encode `row` into a fresh buffer.
pub fn encode_row_to_vec(row: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(encoded_len(row));
    encode_row(row, &mut buf);
    buf.to_vec()
}

/// Size of the encoding of `row`, without producing it.
pub fn encoded_len(row: &[u8]) -> usize {
    let mut len = 0;
    let mut rest = row;
    while let Some(&value) = rest.first() {
        let run = run_len(rest, value);
        len += 2;
        rest = &rest[run..];
    }
    len
}

/// Decode pairs from `src` until `row` is exactly full.
///
/// Returns the number of bytes consumed from `src`, or `None` if `src` runs
/// out first or a pair would overflow `row`. Pairs with a zero count are
/// accepted and contribute no bytes.
pub fn decode_row(src: &[u8], row: &mut [u8]) -> Option<usize> {
    let mut consumed = 0usize;
    let mut filled = 0usize;
    while filled < row.len() {
        let count = *src.get(consumed)? as usize;
        let value = *src.get(consumed + 1)?;
        let end = filled + count;
        row.get_mut(filled..end)?.fill(value);
        filled = end;
        consumed += 2;
    }
    Some(consumed)
}

/// Result of measuring an encoded payload without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLen {
    /// The payload fills the row exactly in this many bytes.
    Complete(usize),
    /// `src` ends before the row is full.
    Cut,
    /// Run counts sum past the row width.
    Overshoot,
}

/// Measure the encoded payload at the front of `src` for a row of `width`
/// bytes.
pub fn measure_payload(src: &[u8], width: usize) -> PayloadLen {
    let mut consumed = 0usize;
    let mut filled = 0usize;
    while filled < width {
        let (Some(&count), Some(_)) = (src.get(consumed), src.get(consumed + 1)) else {
            return PayloadLen::Cut;
        };
        filled += count as usize;
        consumed += 2;
    }
    if filled == width {
        PayloadLen::Complete(consumed)
    } else {
        PayloadLen::Overshoot
    }
}

/// Length of a complete payload at the front of `src`, if there is one.
pub fn payload_len(src: &[u8], width: usize) -> Option<usize> {
    match measure_payload(src, width) {
        PayloadLen::Complete(len) => Some(len),
        PayloadLen::Cut | PayloadLen::Overshoot => None,
    }
}

fn run_len(rest: &[u8], value: u8) -> usize {
    rest.iter().take(MAX_RUN).take_while(|&&b| b == value).count()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn decode(src: &[u8], width: usize) -> Option<Vec<u8>> {
        let mut row = vec![0u8; width];
        decode_row(src, &mut row).map(|_| row)
    }

    #[test]
    fn mixed_runs() {
        assert_eq!(encode_row_to_vec(&[10, 10, 10, 20]), vec![3, 10, 1, 20]);
    }

    #[test]
    fn long_run_splits_at_255() {
        let row = vec![7u8; 600];
        let encoded = encode_row_to_vec(&row);
        assert_eq!(encoded, vec![255, 7, 255, 7, 90, 7]);
        assert_eq!(encoded.len() / 2, row.len().div_ceil(MAX_RUN));
    }

    #[test]
    fn exact_multiple_of_255_has_no_empty_tail() {
        let encoded = encode_row_to_vec(&[1u8; 510]);
        assert_eq!(encoded, vec![255, 1, 255, 1]);
    }

    #[test]
    fn no_adjacent_repeats_gives_unit_pairs() {
        let row: Vec<u8> = (0..=255u8).collect();
        let encoded = encode_row_to_vec(&row);
        assert_eq!(encoded.len(), row.len() * 2);
        assert!(encoded.chunks_exact(2).all(|pair| pair[0] == 1));
    }

    #[test]
    fn empty_row_encodes_to_nothing() {
        assert!(encode_row_to_vec(&[]).is_empty());
        assert_eq!(decode_row(&[], &mut []), Some(0));
    }

    #[test]
    fn decode_reports_consumed_bytes() {
        let mut row = [0u8; 4];
        let consumed = decode_row(&[3, 10, 1, 20, 122, 9, 9], &mut row).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(row, [10, 10, 10, 20]);
    }

    #[test]
    fn decode_accepts_zero_count_pairs() {
        assert_eq!(decode(&[0, 99, 2, 5], 2), Some(vec![5, 5]));
    }

    #[test]
    fn decode_rejects_short_payload() {
        assert_eq!(decode(&[3, 10], 4), None);
        assert_eq!(decode(&[3, 10, 1], 4), None);
    }

    #[test]
    fn decode_rejects_overshoot() {
        assert_eq!(decode(&[5, 10], 4), None);
    }

    #[test]
    fn payload_len_matches_encoding() {
        let row = [1, 1, 2, 3, 3, 3];
        let encoded = encode_row_to_vec(&row);
        assert_eq!(payload_len(&encoded, row.len()), Some(encoded.len()));
        assert_eq!(payload_len(&encoded[..3], row.len()), None);
        assert_eq!(payload_len(&[9, 0], 4), None);
    }

    #[test]
    fn measure_tells_cut_from_overshoot() {
        assert_eq!(measure_payload(&[2, 4], 2), PayloadLen::Complete(2));
        assert_eq!(measure_payload(&[], 2), PayloadLen::Cut);
        assert_eq!(measure_payload(&[1, 4, 1], 2), PayloadLen::Cut);
        assert_eq!(measure_payload(&[3, 4], 2), PayloadLen::Overshoot);
        assert_eq!(measure_payload(&[], 0), PayloadLen::Complete(0));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(row in proptest::collection::vec(0u8..4, 0..1200)) {
            let encoded = encode_row_to_vec(&row);
            prop_assert_eq!(encoded.len(), encoded_len(&row));

            let counts: usize = encoded.chunks_exact(2).map(|p| p[0] as usize).sum();
            prop_assert_eq!(counts, row.len());

            let mut decoded = vec![0u8; row.len()];
            prop_assert_eq!(decode_row(&encoded, &mut decoded), Some(encoded.len()));
            prop_assert_eq!(decoded, row);
        }
    }
}
