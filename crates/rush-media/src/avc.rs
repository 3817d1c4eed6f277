//! H.264 elementary stream normalization.
//!
//! Encoders hand us Annex-B byte streams (start-code delimited NAL units).
//! Video frames carry length-prefixed NAL units instead: each unit is written
//! as a 4-byte big-endian size followed by the unit itself. The NAL size field
//! belongs to the H.264 payload, so it keeps the codec's big-endian order.
//!
//! Parameter sets (SPS/PPS) are not prepended to keyframes.

use bytes::{BufMut, Bytes, BytesMut};

/// Size of the length prefix written before each NAL unit.
pub const NAL_LENGTH_SIZE: usize = 4;

/// Find the next start code at or after `from`.
///
/// Returns `(position, length)` where length is 3 for `00 00 01` and 4 for
/// `00 00 00 01`.
pub fn find_start_code(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            if i > from && data[i - 1] == 0 {
                return Some((i - 1, 4));
            }
            return Some((i, 3));
        }
        i += 1;
    }
    None
}

/// Check if data begins with an Annex-B start code.
pub fn is_annexb(data: &[u8]) -> bool {
    data.starts_with(&[0, 0, 1]) || data.starts_with(&[0, 0, 0, 1])
}

/// Iterator over the NAL units of an Annex-B byte stream.
///
/// Bytes before the first start code are skipped, as are empty units.
/// Trailing zero bytes (`trailing_zero_8bits`) are stripped from each unit.
pub struct AnnexBNalIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AnnexBNalIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let pos = match find_start_code(data, 0) {
            Some((at, len)) => at + len,
            None => data.len(),
        };
        Self { data, pos }
    }
}

impl<'a> Iterator for AnnexBNalIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let start = self.pos;
            let (end, next) = match find_start_code(self.data, start) {
                Some((at, len)) => (at, at + len),
                None => (self.data.len(), self.data.len()),
            };
            self.pos = next;
            let nal = &self.data[start..end];
            let trimmed = nal.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
            if trimmed > 0 {
                return Some(&nal[..trimmed]);
            }
        }
        None
    }
}

/// Convert an Annex-B byte stream to length-prefixed NAL units.
///
/// Data that does not start with a start code is assumed to be framed
/// already and is returned unchanged.
pub fn annexb_to_avcc(data: &Bytes) -> Bytes {
    if !is_annexb(data) {
        return data.clone();
    }

    let mut out = BytesMut::with_capacity(data.len() + NAL_LENGTH_SIZE);
    for nal in AnnexBNalIter::new(data) {
        out.put_u32(nal.len() as u32);
        out.put_slice(nal);
    }
    out.freeze()
}

/// H.264 NAL unit type of a unit (low five bits of its header byte).
pub fn nal_unit_type(nal: &[u8]) -> Option<u8> {
    nal.first().map(|b| b & 0x1f)
}

/// Whether the Annex-B stream contains an IDR slice.
pub fn contains_idr(data: &[u8]) -> bool {
    AnnexBNalIter::new(data).any(|nal| nal_unit_type(nal) == Some(5))
}
