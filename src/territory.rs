use crate::cut::CutStore;
use crate::error::PrunerError;
use crate::trust::TrustModel;
use crate::utils;

/// Gradients below this norm are treated as degenerate and left
/// unscaled when evaluating polyhedral support.
const GRADIENT_TOLERANCE: f64 = 1e-6;

/// A visited state owned by a cut, together with the cut's height
/// there. The stored height always equals the owner's recomputed
/// height at that state.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedState {
    pub state_index: usize,
    pub height: f64,
}

/// Evaluates how strongly the cut at `slot` supports the given state.
///
/// Function senses use the cut height `<a, x> + b`; polyhedral senses
/// use the gradient-scaled slack `(b - <a, x>) / ||a||`. Upper-bound
/// senses are negated so that a larger value is always more
/// supportive.
pub fn cut_height(store: &CutStore, slot: usize, state: &[f64]) -> f64 {
    let coefficients = store.coefficients(slot);
    let value = if store.sense().is_function() {
        utils::dot_product(coefficients, state) + store.offset(slot)
    } else {
        let slack =
            store.offset(slot) - utils::dot_product(coefficients, state);
        let norm = utils::euclidean_norm(coefficients);
        if norm < GRADIENT_TOLERANCE {
            slack
        } else {
            slack / norm
        }
    };
    if store.sense().is_lower_bound() {
        value
    } else {
        -value
    }
}

/// Scores each cut by the number of visited states where it is the
/// pointwise-best supporter.
///
/// Each visited state is owned by exactly one cut. New cuts steal a
/// state only when strictly better there; ties keep the existing
/// owner. States visited while the pool was empty wait in
/// `unassigned` and are handed out at the next admission.
#[derive(Debug)]
pub struct LevelOneTrust {
    states: Vec<Vec<f64>>,
    territories: Vec<Vec<OwnedState>>,
    unassigned: Vec<usize>,
}

impl LevelOneTrust {
    pub fn new() -> Self {
        Self {
            states: vec![],
            territories: vec![],
            unassigned: vec![],
        }
    }

    pub fn nstates(&self) -> usize {
        self.states.len()
    }

    pub fn territory(&self, slot: usize) -> &[OwnedState] {
        self.territories[slot].as_slice()
    }

    /// The cut currently owning the given state, if any.
    pub fn owner_of(&self, state_index: usize) -> Option<usize> {
        for (slot, territory) in self.territories.iter().enumerate() {
            if territory
                .iter()
                .any(|entry| entry.state_index == state_index)
            {
                return Some(slot);
            }
        }
        None
    }

    /// Hands a state to the cut with the greatest height there; the
    /// first slot wins ties. With no cuts in the pool the state is
    /// parked as unassigned.
    fn give_territory(&mut self, store: &CutStore, state_index: usize) {
        if store.ncuts() == 0 {
            self.unassigned.push(state_index);
            return;
        }
        let state = &self.states[state_index];
        let mut best_slot = 0;
        let mut best_height = cut_height(store, 0, state);
        for slot in 1..store.ncuts() {
            let height = cut_height(store, slot, state);
            if height > best_height {
                best_slot = slot;
                best_height = height;
            }
        }
        self.territories[best_slot].push(OwnedState {
            state_index,
            height: best_height,
        });
    }

    /// Lets the (new) cut at `slot` steal every state where it is
    /// strictly better than the current owner.
    fn update_territory_for_new_cut(&mut self, store: &CutStore, slot: usize) {
        let mut stolen: Vec<OwnedState> = vec![];
        for other in 0..self.territories.len() {
            if other == slot {
                continue;
            }
            let owned = std::mem::take(&mut self.territories[other]);
            let mut kept = Vec::with_capacity(owned.len());
            for entry in owned {
                let height =
                    cut_height(store, slot, &self.states[entry.state_index]);
                if height > entry.height {
                    stolen.push(OwnedState {
                        state_index: entry.state_index,
                        height,
                    });
                } else {
                    kept.push(entry);
                }
            }
            self.territories[other] = kept;
        }
        self.territories[slot].extend(stolen);
    }

    fn rehome_unassigned(&mut self, store: &CutStore) {
        let pending = std::mem::take(&mut self.unassigned);
        for state_index in pending {
            self.give_territory(store, state_index);
        }
    }

    fn refresh_trust(&self, trust: &mut Vec<f64>) {
        trust.clear();
        trust.extend(
            self.territories
                .iter()
                .map(|territory| territory.len() as f64),
        );
    }

    fn add_state(&mut self, store: &CutStore, state: Vec<f64>) {
        self.states.push(state);
        self.give_territory(store, self.states.len() - 1);
    }

    /// Verifies the territory bookkeeping against the store: one owner
    /// per state, stored heights exact, every owner pointwise-optimal.
    pub fn check_partition(
        &self,
        store: &CutStore,
    ) -> Result<(), PrunerError> {
        if self.territories.len() != store.ncuts() {
            return Err(PrunerError::Invariant(format!(
                "{} territories for {} cuts",
                self.territories.len(),
                store.ncuts()
            )));
        }
        let mut owner: Vec<Option<usize>> = vec![None; self.states.len()];
        for (slot, territory) in self.territories.iter().enumerate() {
            for entry in territory.iter() {
                if entry.state_index >= self.states.len() {
                    return Err(PrunerError::Invariant(format!(
                        "territory of cut {} references unknown state {}",
                        slot, entry.state_index
                    )));
                }
                if let Some(previous) = owner[entry.state_index] {
                    return Err(PrunerError::Invariant(format!(
                        "state {} owned by cuts {} and {}",
                        entry.state_index, previous, slot
                    )));
                }
                owner[entry.state_index] = Some(slot);
                let state = &self.states[entry.state_index];
                if cut_height(store, slot, state) != entry.height {
                    return Err(PrunerError::Invariant(format!(
                        "stale height for state {} at cut {}",
                        entry.state_index, slot
                    )));
                }
                for other in 0..store.ncuts() {
                    if cut_height(store, other, state) > entry.height {
                        return Err(PrunerError::Invariant(format!(
                            "cut {} undercuts owner {} at state {}",
                            other, slot, entry.state_index
                        )));
                    }
                }
            }
        }
        for (state_index, state_owner) in owner.iter().enumerate() {
            if state_owner.is_none()
                && !self.unassigned.contains(&state_index)
            {
                return Err(PrunerError::Invariant(format!(
                    "state {} has no owner",
                    state_index
                )));
            }
        }
        Ok(())
    }
}

impl TrustModel for LevelOneTrust {
    type Signal = [Vec<f64>];

    fn initial_trust(&self, _is_my_cut: bool) -> f64 {
        0.0
    }

    fn on_append(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        is_my_cut: &[bool],
    ) {
        let first_new = store.ncuts() - is_my_cut.len();
        for _ in 0..is_my_cut.len() {
            self.territories.push(vec![]);
        }
        for slot in first_new..store.ncuts() {
            self.update_territory_for_new_cut(store, slot);
        }
        self.rehome_unassigned(store);
        self.refresh_trust(trust);
    }

    fn on_replace(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        slots: &[usize],
        _is_my_cut: &[bool],
    ) {
        let mut orphans: Vec<usize> = vec![];
        for &slot in slots.iter() {
            for entry in std::mem::take(&mut self.territories[slot]) {
                orphans.push(entry.state_index);
            }
        }
        for &slot in slots.iter() {
            self.update_territory_for_new_cut(store, slot);
        }
        for state_index in orphans {
            self.give_territory(store, state_index);
        }
        self.rehome_unassigned(store);
        self.refresh_trust(trust);
    }

    fn on_keep_only(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        kept: &[usize],
    ) {
        let mut old = std::mem::take(&mut self.territories);
        self.territories = kept
            .iter()
            .map(|&slot| std::mem::take(&mut old[slot]))
            .collect();
        let orphans: Vec<usize> = old
            .into_iter()
            .flatten()
            .map(|entry| entry.state_index)
            .collect();
        for state_index in orphans {
            self.give_territory(store, state_index);
        }
        self.refresh_trust(trust);
    }

    fn update_stats(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        signal: &[Vec<f64>],
    ) -> Result<(), PrunerError> {
        for state in signal.iter() {
            if state.len() != store.dimension() {
                return Err(PrunerError::Shape(format!(
                    "visited state has {} coordinates for dimension {}",
                    state.len(),
                    store.dimension()
                )));
            }
        }
        for state in signal.iter() {
            self.add_state(store, state.clone());
        }
        self.refresh_trust(trust);
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cut::Sense;

    fn max_store(rows: &[Vec<f64>], offsets: &[f64]) -> CutStore {
        let mut store = CutStore::new(rows[0].len(), Sense::Max);
        store.append(rows, offsets);
        store
    }

    #[test]
    fn test_cut_height_function_senses() {
        let store = max_store(&[vec![2.0, 1.0]], &[3.0]);
        assert_eq!(cut_height(&store, 0, &[1.0, 1.0]), 6.0);

        let mut min_store = CutStore::new(2, Sense::Min);
        min_store.append(&[vec![2.0, 1.0]], &[3.0]);
        assert_eq!(cut_height(&min_store, 0, &[1.0, 1.0]), -6.0);
    }

    #[test]
    fn test_cut_height_polyhedral_senses() {
        let mut geq = CutStore::new(2, Sense::Geq);
        geq.append(&[vec![3.0, 4.0]], &[5.0]);
        // slack (5 - 3) scaled by the gradient norm 5
        assert_eq!(cut_height(&geq, 0, &[1.0, 0.0]), 0.4);

        let mut leq = CutStore::new(2, Sense::Leq);
        leq.append(&[vec![3.0, 4.0]], &[5.0]);
        assert_eq!(cut_height(&leq, 0, &[1.0, 0.0]), -0.4);
    }

    #[test]
    fn test_territory_assignment_over_sampled_states() {
        let store = max_store(
            &[vec![1.0], vec![-1.0], vec![0.0]],
            &[0.0, 2.0, 1.0],
        );
        let mut policy = LevelOneTrust::new();
        let mut trust = vec![];
        policy.on_append(&store, &mut trust, &[true, true, true]);

        let states = vec![vec![-1.0], vec![0.0], vec![1.0], vec![2.0]];
        policy.update_stats(&store, &mut trust, &states).unwrap();

        assert_eq!(policy.owner_of(0), Some(1));
        assert_eq!(policy.owner_of(1), Some(1));
        // three-way tie at x = 1: the first slot wins
        assert_eq!(policy.owner_of(2), Some(0));
        assert_eq!(policy.owner_of(3), Some(0));
        assert_eq!(trust, vec![2.0, 2.0, 0.0]);
        policy.check_partition(&store).unwrap();
    }

    #[test]
    fn test_new_cut_steals_only_strictly_better_states() {
        let mut store = max_store(&[vec![1.0]], &[0.0]);
        let mut policy = LevelOneTrust::new();
        let mut trust = vec![];
        policy.on_append(&store, &mut trust, &[true]);
        policy
            .update_stats(&store, &mut trust, &[vec![0.0], vec![2.0]])
            .unwrap();
        assert_eq!(trust, vec![2.0]);

        // equal height at x = 2, strictly better at x = 0
        store.append(&[vec![0.0]], &[2.0]);
        policy.on_append(&store, &mut trust, &[true]);
        assert_eq!(policy.owner_of(0), Some(1));
        assert_eq!(policy.owner_of(1), Some(0));
        assert_eq!(trust, vec![1.0, 1.0]);
        policy.check_partition(&store).unwrap();
    }

    #[test]
    fn test_replace_rehomes_orphaned_states() {
        let mut store = max_store(&[vec![1.0], vec![-1.0]], &[0.0, 0.0]);
        let mut policy = LevelOneTrust::new();
        let mut trust = vec![];
        policy.on_append(&store, &mut trust, &[true, true]);
        policy
            .update_stats(&store, &mut trust, &[vec![1.0], vec![-1.0]])
            .unwrap();
        assert_eq!(trust, vec![1.0, 1.0]);

        // the replacement supports neither state: both must land on
        // the surviving cut
        store.replace_at(&[0], &[vec![0.0]], &[-10.0]);
        policy.on_replace(&store, &mut trust, &[0], &[true]);
        assert_eq!(policy.owner_of(0), Some(1));
        assert_eq!(policy.owner_of(1), Some(1));
        assert_eq!(trust, vec![0.0, 2.0]);
        policy.check_partition(&store).unwrap();
    }

    #[test]
    fn test_keep_only_rehomes_dropped_territory() {
        let mut store =
            max_store(&[vec![1.0], vec![-1.0], vec![0.0]], &[0.0, 0.0, 0.5]);
        let mut policy = LevelOneTrust::new();
        let mut trust = vec![];
        policy.on_append(&store, &mut trust, &[true, true, true]);
        policy
            .update_stats(&store, &mut trust, &[vec![1.0], vec![-1.0]])
            .unwrap();
        assert_eq!(trust, vec![1.0, 1.0, 0.0]);

        store.keep_only(&[2, 0]);
        policy.on_keep_only(&store, &mut trust, &[2, 0]);
        // the dropped cut owned state 1; the flat cut is now best there
        assert_eq!(policy.owner_of(0), Some(1));
        assert_eq!(policy.owner_of(1), Some(0));
        assert_eq!(trust, vec![1.0, 1.0]);
        policy.check_partition(&store).unwrap();
    }

    #[test]
    fn test_states_visited_before_any_cut_are_parked() {
        let mut store = CutStore::new(1, Sense::Max);
        let mut policy = LevelOneTrust::new();
        let mut trust = vec![];
        policy
            .update_stats(&store, &mut trust, &[vec![1.0], vec![2.0]])
            .unwrap();
        assert_eq!(policy.nstates(), 2);
        assert_eq!(policy.owner_of(0), None);
        policy.check_partition(&store).unwrap();

        store.append(&[vec![1.0]], &[0.0]);
        policy.on_append(&store, &mut trust, &[true]);
        assert_eq!(policy.owner_of(0), Some(0));
        assert_eq!(policy.owner_of(1), Some(0));
        assert_eq!(trust, vec![2.0]);
        policy.check_partition(&store).unwrap();
    }

    #[test]
    fn test_state_dimension_mismatch() {
        let store = max_store(&[vec![1.0, 0.0]], &[0.0]);
        let mut policy = LevelOneTrust::new();
        let mut trust = vec![0.0];
        assert!(matches!(
            policy.update_stats(&store, &mut trust, &[vec![1.0]]),
            Err(PrunerError::Shape(_))
        ));
        // rejected batches leave no partial state behind
        assert_eq!(policy.nstates(), 0);
    }
}
