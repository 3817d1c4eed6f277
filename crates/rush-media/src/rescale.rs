//! Timestamp rescaling from a packet timebase to a RUSH timescale.

use rush_common::Timebase;

/// Convert `ts` (in `timebase` units) to ticks of `timescale` per second.
///
/// Computes `ts * timescale * num / den`, multiplying before dividing so no
/// precision is lost for the usual `1/rate` timebases. Very large timestamps
/// combined with large timescales overflow; the arithmetic wraps rather than
/// being guarded. A zero denominator yields 0.
pub fn rescale(ts: i64, timebase: Timebase, timescale: i64) -> i64 {
    ts.wrapping_mul(timescale)
        .wrapping_mul(timebase.num)
        .checked_div(timebase.den)
        .unwrap_or(0)
}
