use crate::cut::CutStore;
use crate::utils;

/// The normalized form of a cut: gradient scaled to unit Euclidean
/// norm for polyhedral senses, untouched for function senses and for
/// near-zero gradients.
fn normalize(
    coefficients: &[f64],
    offset: f64,
    is_function: bool,
    tolerance: f64,
) -> (Vec<f64>, f64) {
    if is_function {
        return (coefficients.to_vec(), offset);
    }
    let norm = utils::euclidean_norm(coefficients);
    if norm < tolerance {
        return (coefficients.to_vec(), offset);
    }
    let scaled: Vec<f64> = coefficients.iter().map(|a| a / norm).collect();
    (scaled, offset / norm)
}

/// Flags incoming cuts that duplicate an existing cut without
/// improving on it.
///
/// An incoming cut is redundant when some existing cut has the same
/// normalized gradient (within the Chebyshev tolerance) and an offset
/// that dominates the incoming one. The first gradient match decides;
/// parallel cuts with gradients outside the tolerance are never
/// flagged, and candidates are not compared against each other.
pub fn find_redundant(
    store: &CutStore,
    coefficients: &[Vec<f64>],
    offsets: &[f64],
    tolerance: f64,
) -> Vec<bool> {
    let is_function = store.sense().is_function();
    let is_lower_bound = store.sense().is_lower_bound();

    let existing: Vec<(Vec<f64>, f64)> = (0..store.ncuts())
        .map(|slot| {
            normalize(
                store.coefficients(slot),
                store.offset(slot),
                is_function,
                tolerance,
            )
        })
        .collect();

    let mut redundant = vec![false; coefficients.len()];
    for (k, (row, &offset)) in
        coefficients.iter().zip(offsets.iter()).enumerate()
    {
        let (new_row, new_offset) =
            normalize(row, offset, is_function, tolerance);
        for (old_row, old_offset) in existing.iter() {
            if utils::chebyshev_distance(&new_row, old_row) <= tolerance {
                redundant[k] = if is_lower_bound {
                    new_offset <= old_offset + tolerance
                } else {
                    new_offset + tolerance >= *old_offset
                };
                break;
            }
        }
    }
    redundant
}
