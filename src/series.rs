use std::cmp::Ordering;

use log::warn;

use crate::slice::RawSlice;

/// Sort a set of slices into a spatially monotonic sequence along the scan
/// axis.
///
/// The primary key is the slice position's Z component. The key is only usable
/// when every slice carries a finite value for it; otherwise the whole
/// sequence falls back to the acquisition instance number, so that one record
/// with missing geometry cannot produce a mixed ordering. Ties keep their
/// input order (stable sort).
pub fn order_slices(mut slices: Vec<RawSlice>) -> Vec<RawSlice> {
    let positions_usable = slices
        .iter()
        .all(|s| s.metadata().position_z.is_some_and(f32::is_finite));

    if positions_usable {
        slices.sort_by(|a, b| {
            a.metadata()
                .position_z
                .partial_cmp(&b.metadata().position_z)
                .unwrap_or(Ordering::Equal)
        });
    } else {
        if slices.iter().any(|s| s.metadata().position_z.is_some()) {
            warn!("slice positions incomplete, ordering whole series by instance number");
        }
        slices.sort_by_key(|s| s.metadata().instance_number.unwrap_or(0));
    }

    slices
}
