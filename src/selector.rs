use std::cmp::Ordering;

/// Compares two slots by the lexicographic `(trust, id)` key. Equal
/// trust and equal id cannot coexist in a pool, so this is a total
/// order over the slots.
fn slot_key_cmp(
    trust: &[f64],
    ids: &[usize],
    a: usize,
    b: usize,
) -> Ordering {
    trust[a].total_cmp(&trust[b]).then(ids[a].cmp(&ids[b]))
}

/// Selects the `num` weakest slots, ordered ascending by the
/// `(trust, id)` key: the first selected slot has the lowest trust,
/// with ties going to the smaller (older) id. At most `trust.len()`
/// slots are returned.
pub fn choose_to_remove(
    trust: &[f64],
    ids: &[usize],
    num: usize,
) -> Vec<usize> {
    let ncuts = trust.len();
    let num = num.min(ncuts);
    if num == 0 {
        return vec![];
    }
    if num == 1 {
        let mut weakest = 0;
        for slot in 1..ncuts {
            if slot_key_cmp(trust, ids, slot, weakest) == Ordering::Less {
                weakest = slot;
            }
        }
        return vec![weakest];
    }

    let mut slots: Vec<usize> = (0..ncuts).collect();
    if num < ncuts {
        slots.select_nth_unstable_by(num - 1, |&a, &b| {
            slot_key_cmp(trust, ids, a, b)
        });
        slots.truncate(num);
    }
    slots.sort_unstable_by(|&a, &b| slot_key_cmp(trust, ids, a, b));
    slots
}
