use crate::cut::{CutStore, Sense};
use crate::error::PrunerError;
use crate::redundancy;
use crate::selector;
use crate::territory::LevelOneTrust;
use crate::trust::{AverageTrust, DecayTrust, TrustModel};

/// Default tolerance for the redundancy filter.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

pub type AvgCutPruner = CutPruner<AverageTrust>;
pub type DecayCutPruner = CutPruner<DecayTrust>;
pub type LevelOneCutPruner = CutPruner<LevelOneTrust>;

/// A bounded pool of affine cuts with trust-based admission.
///
/// The pruner owns the cut store and the trust vector; the scoring
/// policy decides how trust evolves and how incumbents compare against
/// incoming cuts. All mutating operations keep the store, the ids, the
/// trust vector and the policy's bookkeeping aligned.
pub struct CutPruner<P: TrustModel> {
    store: CutStore,
    trust: Vec<f64>,
    policy: P,
    max_cuts: Option<usize>,
    tolerance: f64,
}

impl<P: TrustModel> CutPruner<P> {
    /// Builds an empty pruner. `max_cuts` of `None` means unbounded;
    /// a bounded capacity must be positive.
    pub fn new(
        dimension: usize,
        sense: Sense,
        max_cuts: Option<usize>,
        policy: P,
    ) -> Result<Self, PrunerError> {
        if max_cuts == Some(0) {
            return Err(PrunerError::Configuration(
                "cut capacity must be positive".into(),
            ));
        }
        Ok(Self {
            store: CutStore::new(dimension, sense),
            trust: vec![],
            policy,
            max_cuts,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    pub fn ncuts(&self) -> usize {
        self.store.ncuts()
    }

    pub fn is_empty(&self) -> bool {
        self.store.ncuts() == 0
    }

    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    pub fn get_sense(&self) -> Sense {
        self.store.sense()
    }

    pub fn get_trust(&self) -> &[f64] {
        self.trust.as_slice()
    }

    pub fn get_ids(&self) -> &[usize] {
        self.store.ids()
    }

    pub fn get_coefficients(&self, slot: usize) -> &[f64] {
        self.store.coefficients(slot)
    }

    pub fn get_offset(&self, slot: usize) -> f64 {
        self.store.offset(slot)
    }

    fn check_batch_shape(
        &self,
        coefficients: &[Vec<f64>],
        offsets: &[f64],
        is_my_cut: &[bool],
    ) -> Result<(), PrunerError> {
        if coefficients.len() != offsets.len()
            || coefficients.len() != is_my_cut.len()
        {
            return Err(PrunerError::Shape(format!(
                "batch with {} rows, {} offsets and {} flags",
                coefficients.len(),
                offsets.len(),
                is_my_cut.len()
            )));
        }
        for row in coefficients.iter() {
            if row.len() != self.store.dimension() {
                return Err(PrunerError::Shape(format!(
                    "cut with {} coefficients for dimension {}",
                    row.len(),
                    self.store.dimension()
                )));
            }
        }
        Ok(())
    }

    fn check_slots(
        &self,
        slots: &[usize],
        require_unique: bool,
    ) -> Result<(), PrunerError> {
        let mut seen = vec![false; self.store.ncuts()];
        for &slot in slots.iter() {
            if slot >= self.store.ncuts() {
                return Err(PrunerError::Shape(format!(
                    "slot {} out of range for {} cuts",
                    slot,
                    self.store.ncuts()
                )));
            }
            if require_unique && seen[slot] {
                return Err(PrunerError::Shape(format!(
                    "slot {} repeated",
                    slot
                )));
            }
            seen[slot] = true;
        }
        Ok(())
    }

    /// Offers a batch of candidate cuts to the pool.
    ///
    /// Returns one entry per candidate: `None` when the candidate was
    /// rejected (redundant, or not worth an eviction), `Some(slot)`
    /// with its final slot index otherwise. A batch in which every
    /// candidate is redundant changes no state.
    pub fn add_cuts(
        &mut self,
        coefficients: &[Vec<f64>],
        offsets: &[f64],
        is_my_cut: &[bool],
    ) -> Result<Vec<Option<usize>>, PrunerError> {
        self.check_batch_shape(coefficients, offsets, is_my_cut)?;
        let mut status: Vec<Option<usize>> = vec![None; coefficients.len()];
        if coefficients.is_empty() {
            return Ok(status);
        }

        let redundant = redundancy::find_redundant(
            &self.store,
            coefficients,
            offsets,
            self.tolerance,
        );
        let survivors: Vec<usize> =
            (0..coefficients.len()).filter(|&k| !redundant[k]).collect();
        if survivors.is_empty() {
            return Ok(status);
        }

        let ncur = self.store.ncuts();
        let nnew = survivors.len();

        match self.max_cuts {
            Some(capacity) if ncur + nnew > capacity => {
                let plan =
                    self.plan_eviction(capacity, &survivors, is_my_cut);
                self.commit(
                    &plan,
                    coefficients,
                    offsets,
                    is_my_cut,
                    &mut status,
                );
            }
            _ => {
                let rows: Vec<Vec<f64>> = survivors
                    .iter()
                    .map(|&k| coefficients[k].clone())
                    .collect();
                let offs: Vec<f64> =
                    survivors.iter().map(|&k| offsets[k]).collect();
                let flags: Vec<bool> =
                    survivors.iter().map(|&k| is_my_cut[k]).collect();
                self.store.append(&rows, &offs);
                self.policy.on_append(&self.store, &mut self.trust, &flags);
                for (position, &k) in survivors.iter().enumerate() {
                    status[k] = Some(ncur + position);
                }
            }
        }
        Ok(status)
    }

    /// Decides which incumbents are evicted and which survivors are
    /// admitted when the batch does not fit.
    ///
    /// Walks the weakest incumbents from the most defensible end: an
    /// incumbent that beats a hypothetical newcomer keeps its slot
    /// (one candidate is rejected); otherwise one more admission is
    /// granted. The capacity clause only triggers when the batch alone
    /// exceeds the whole pool. Returns the eviction plan.
    fn plan_eviction(
        &self,
        capacity: usize,
        survivors: &[usize],
        is_my_cut: &[bool],
    ) -> EvictionPlan {
        let ncur = self.store.ncuts();
        let nnew = survivors.len();
        let n_my =
            survivors.iter().filter(|&&k| is_my_cut[k]).count();

        let weakest = selector::choose_to_remove(
            &self.trust,
            self.store.ids(),
            ncur + nnew - capacity,
        );
        let free = capacity - ncur;
        let mut take = free;
        let mut n_replaced = weakest.len();
        while take + weakest.len() < nnew + n_replaced
            && take < free + n_replaced
        {
            let slot = weakest[n_replaced - 1];
            let hypothetical_my = take < n_my;
            if self.policy.is_better(&self.trust, slot, hypothetical_my) {
                n_replaced -= 1;
            } else {
                take += 1;
            }
        }

        // my-cuts are admitted first, in input order
        let my_quota = take.min(n_my);
        let mut admitted: Vec<usize> = Vec::with_capacity(take);
        for &k in survivors.iter() {
            if is_my_cut[k] && admitted.len() < my_quota {
                admitted.push(k);
            }
        }
        for &k in survivors.iter() {
            if !is_my_cut[k] && admitted.len() < take {
                admitted.push(k);
            }
        }

        EvictionPlan {
            replaced_slots: weakest[..n_replaced].to_vec(),
            admitted,
        }
    }

    fn commit(
        &mut self,
        plan: &EvictionPlan,
        coefficients: &[Vec<f64>],
        offsets: &[f64],
        is_my_cut: &[bool],
        status: &mut [Option<usize>],
    ) {
        let ncur = self.store.ncuts();
        let n_replaced = plan.replaced_slots.len();
        let replacing = &plan.admitted[..n_replaced];
        let appending = &plan.admitted[n_replaced..];

        if !replacing.is_empty() {
            let rows: Vec<Vec<f64>> = replacing
                .iter()
                .map(|&k| coefficients[k].clone())
                .collect();
            let offs: Vec<f64> =
                replacing.iter().map(|&k| offsets[k]).collect();
            let flags: Vec<bool> =
                replacing.iter().map(|&k| is_my_cut[k]).collect();
            self.store.replace_at(&plan.replaced_slots, &rows, &offs);
            self.policy.on_replace(
                &self.store,
                &mut self.trust,
                &plan.replaced_slots,
                &flags,
            );
            for (&slot, &k) in
                plan.replaced_slots.iter().zip(replacing.iter())
            {
                status[k] = Some(slot);
            }
        }
        if !appending.is_empty() {
            let rows: Vec<Vec<f64>> = appending
                .iter()
                .map(|&k| coefficients[k].clone())
                .collect();
            let offs: Vec<f64> =
                appending.iter().map(|&k| offsets[k]).collect();
            let flags: Vec<bool> =
                appending.iter().map(|&k| is_my_cut[k]).collect();
            self.store.append(&rows, &offs);
            self.policy.on_append(&self.store, &mut self.trust, &flags);
            for (position, &k) in appending.iter().enumerate() {
                status[k] = Some(ncur + position);
            }
        }
    }

    /// Feeds one optimization step's observation to the scoring
    /// policy: dual multipliers for the counter-based policies, newly
    /// visited states for the territory policy.
    pub fn update_stats(
        &mut self,
        signal: &P::Signal,
    ) -> Result<(), PrunerError> {
        self.policy
            .update_stats(&self.store, &mut self.trust, signal)
    }

    /// Keeps only the given slots, in the given order.
    pub fn keep_only_cuts(
        &mut self,
        kept: &[usize],
    ) -> Result<(), PrunerError> {
        self.check_slots(kept, true)?;
        self.trust = kept.iter().map(|&slot| self.trust[slot]).collect();
        self.store.keep_only(kept);
        self.policy
            .on_keep_only(&self.store, &mut self.trust, kept);
        Ok(())
    }

    /// Drops the given slots, keeping the remaining cuts in order.
    pub fn remove_cuts(
        &mut self,
        slots: &[usize],
    ) -> Result<(), PrunerError> {
        self.check_slots(slots, false)?;
        let mut removed = vec![false; self.store.ncuts()];
        for &slot in slots.iter() {
            removed[slot] = true;
        }
        let kept: Vec<usize> = (0..self.store.ncuts())
            .filter(|&slot| !removed[slot])
            .collect();
        self.keep_only_cuts(&kept)
    }

    /// Overwrites the given slots with new cuts, resetting their ids
    /// and trust as if freshly admitted.
    pub fn replace_cuts(
        &mut self,
        slots: &[usize],
        coefficients: &[Vec<f64>],
        offsets: &[f64],
        is_my_cut: &[bool],
    ) -> Result<(), PrunerError> {
        self.check_batch_shape(coefficients, offsets, is_my_cut)?;
        if slots.len() != coefficients.len() {
            return Err(PrunerError::Shape(format!(
                "{} slots for {} replacement cuts",
                slots.len(),
                coefficients.len()
            )));
        }
        self.check_slots(slots, true)?;
        self.store.replace_at(slots, coefficients, offsets);
        self.policy.on_replace(
            &self.store,
            &mut self.trust,
            slots,
            is_my_cut,
        );
        Ok(())
    }

    /// Verifies the structural invariants of the pool. A failure
    /// means the pruner is poisoned and must not be used further.
    pub fn check_consistency(&self) -> Result<(), PrunerError> {
        let ncuts = self.store.ncuts();
        if self.trust.len() != ncuts {
            return Err(PrunerError::Invariant(format!(
                "{} trust entries for {} cuts",
                self.trust.len(),
                ncuts
            )));
        }
        if let Some(capacity) = self.max_cuts {
            if ncuts > capacity {
                return Err(PrunerError::Invariant(format!(
                    "{} cuts exceed capacity {}",
                    ncuts, capacity
                )));
            }
        }
        let mut ids = self.store.ids().to_vec();
        ids.sort_unstable();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(PrunerError::Invariant(format!(
                    "duplicate cut id {}",
                    pair[0]
                )));
            }
        }
        if let Some(&largest) = ids.last() {
            if largest >= self.store.id_cursor() {
                return Err(PrunerError::Invariant(format!(
                    "cut id {} ahead of cursor {}",
                    largest,
                    self.store.id_cursor()
                )));
            }
        }
        Ok(())
    }
}

impl CutPruner<LevelOneTrust> {
    /// Verifies the territory bookkeeping on top of the structural
    /// invariants.
    pub fn check_territories(&self) -> Result<(), PrunerError> {
        self.check_consistency()?;
        self.policy.check_partition(&self.store)
    }
}

struct EvictionPlan {
    replaced_slots: Vec<usize>,
    admitted: Vec<usize>,
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::prelude::*;
    use rand_distr::{Normal, Uniform};
    use rand_xoshiro::Xoshiro256Plus;

    fn sorted_leading_coefficients<P: TrustModel>(
        pruner: &CutPruner<P>,
    ) -> Vec<f64> {
        let mut values: Vec<f64> = (0..pruner.ncuts())
            .map(|slot| pruner.get_coefficients(slot)[0])
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    #[test]
    fn test_capacity_must_be_positive() {
        assert!(matches!(
            AvgCutPruner::new(
                2,
                Sense::Min,
                Some(0),
                AverageTrust::default()
            ),
            Err(PrunerError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_batch_returns_empty_status() {
        let mut pruner = AvgCutPruner::new(
            2,
            Sense::Min,
            Some(3),
            AverageTrust::default(),
        )
        .unwrap();
        let status = pruner.add_cuts(&[], &[], &[]).unwrap();
        assert!(status.is_empty());
        assert!(pruner.is_empty());
    }

    #[test]
    fn test_batch_shape_mismatch() {
        let mut pruner = AvgCutPruner::new(
            2,
            Sense::Min,
            None,
            AverageTrust::default(),
        )
        .unwrap();
        assert!(matches!(
            pruner.add_cuts(&[vec![1.0, 0.0]], &[0.0, 1.0], &[true]),
            Err(PrunerError::Shape(_))
        ));
        assert!(matches!(
            pruner.add_cuts(&[vec![1.0]], &[0.0], &[true]),
            Err(PrunerError::Shape(_))
        ));
    }

    #[test]
    fn test_age_first_eviction() {
        let mut pruner = AvgCutPruner::new(
            2,
            Sense::Min,
            Some(3),
            AverageTrust::default(),
        )
        .unwrap();
        for value in [1.0, 2.0, 3.0, 4.0] {
            pruner
                .add_cuts(&[vec![value, 0.0]], &[0.0], &[true])
                .unwrap();
        }
        assert_eq!(sorted_leading_coefficients(&pruner), vec![2.0, 3.0, 4.0]);

        pruner.add_cuts(&[vec![5.0, 0.0]], &[0.0], &[true]).unwrap();
        assert_eq!(sorted_leading_coefficients(&pruner), vec![3.0, 4.0, 5.0]);

        // an equal-trust foreign cut does not displace an incumbent
        let status = pruner
            .add_cuts(&[vec![6.0, 0.0]], &[0.0], &[false])
            .unwrap();
        assert_eq!(status, vec![None]);
        assert_eq!(sorted_leading_coefficients(&pruner), vec![3.0, 4.0, 5.0]);

        let status = pruner
            .add_cuts(
                &[vec![7.0, 0.0], vec![8.0, 0.0]],
                &[0.0, 0.0],
                &[true, true],
            )
            .unwrap();
        assert_eq!(status.iter().filter(|s| s.is_some()).count(), 2);
        assert_eq!(sorted_leading_coefficients(&pruner), vec![5.0, 7.0, 8.0]);
        pruner.check_consistency().unwrap();
    }

    #[test]
    fn test_admission_prefers_my_cuts_and_strong_incumbents() {
        let mut pruner = AvgCutPruner::new(
            2,
            Sense::Leq,
            Some(2),
            AverageTrust::default(),
        )
        .unwrap();
        let status = pruner
            .add_cuts(&[vec![1.0, 0.0]], &[1.0], &[true])
            .unwrap();
        assert_eq!(status, vec![Some(0)]);
        let status = pruner
            .add_cuts(&[vec![0.0, 1.0]], &[1.0], &[true])
            .unwrap();
        assert_eq!(status, vec![Some(1)]);

        pruner.update_stats(&[1.0, 0.0]).unwrap();
        assert_eq!(pruner.get_trust(), &[1.0, 0.0]);

        // the third candidate duplicates the second cut with a weaker
        // offset; the second candidate loses to the used incumbent
        let status = pruner
            .add_cuts(
                &[vec![1.0, 1.0], vec![-1.0, -1.0], vec![0.0, 1.0]],
                &[1.0, 1.0, 2.0],
                &[true, false, true],
            )
            .unwrap();
        assert_eq!(status, vec![Some(1), None, None]);
        assert_eq!(pruner.get_coefficients(0), &[1.0, 0.0]);
        assert_eq!(pruner.get_coefficients(1), &[1.0, 1.0]);
        assert_eq!(pruner.get_offset(0), 1.0);
        assert_eq!(pruner.get_offset(1), 1.0);
        assert_eq!(pruner.get_ids(), &[0, 2]);
        pruner.check_consistency().unwrap();
    }

    #[test]
    fn test_redundant_candidate_rejected() {
        let mut pruner = AvgCutPruner::new(
            2,
            Sense::Geq,
            None,
            AverageTrust::default(),
        )
        .unwrap();
        pruner.add_cuts(&[vec![1.0, 0.0]], &[0.0], &[true]).unwrap();
        let status = pruner
            .add_cuts(&[vec![2.0, 0.0]], &[0.0], &[true])
            .unwrap();
        assert_eq!(status, vec![None]);
        assert_eq!(pruner.ncuts(), 1);
    }

    #[test]
    fn test_redundancy_idempotence() {
        let mut pruner = AvgCutPruner::new(
            2,
            Sense::Geq,
            Some(10),
            AverageTrust::default(),
        )
        .unwrap();
        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let offsets = vec![0.5, 0.5];
        let flags = vec![true, false];
        pruner.add_cuts(&rows, &offsets, &flags).unwrap();
        let ids_before = pruner.get_ids().to_vec();

        let status = pruner.add_cuts(&rows, &offsets, &flags).unwrap();
        assert_eq!(status, vec![None, None]);
        assert_eq!(pruner.ncuts(), 2);
        assert_eq!(pruner.get_ids(), ids_before.as_slice());
        assert_eq!(pruner.get_coefficients(0), &[1.0, 0.0]);
        assert_eq!(pruner.get_coefficients(1), &[0.0, 1.0]);
    }

    #[test]
    fn test_exact_capacity_batch_appends_without_eviction() {
        let mut pruner = AvgCutPruner::new(
            1,
            Sense::Max,
            Some(5),
            AverageTrust::default(),
        )
        .unwrap();
        let rows: Vec<Vec<f64>> =
            (0..5).map(|k| vec![k as f64]).collect();
        let offsets = vec![0.0; 5];
        let flags = vec![true; 5];
        let status = pruner.add_cuts(&rows, &offsets, &flags).unwrap();
        assert_eq!(
            status,
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
        assert_eq!(pruner.get_ids(), &[0, 1, 2, 3, 4]);
        pruner.check_consistency().unwrap();
    }

    #[test]
    fn test_oldest_cut_loses_trust_ties() {
        let mut pruner = AvgCutPruner::new(
            1,
            Sense::Max,
            Some(2),
            AverageTrust::default(),
        )
        .unwrap();
        pruner.add_cuts(&[vec![1.0]], &[0.0], &[true]).unwrap();
        pruner.add_cuts(&[vec![2.0]], &[0.0], &[true]).unwrap();
        pruner.add_cuts(&[vec![3.0]], &[0.0], &[true]).unwrap();
        // the slot of the oldest cut was recycled with a fresh id
        assert_eq!(pruner.get_ids(), &[2, 1]);
        assert_eq!(pruner.get_coefficients(0), &[3.0]);
    }

    #[test]
    fn test_batch_larger_than_capacity_from_empty_pool() {
        let mut pruner = AvgCutPruner::new(
            1,
            Sense::Max,
            Some(3),
            AverageTrust::default(),
        )
        .unwrap();
        let rows: Vec<Vec<f64>> =
            (0..5).map(|k| vec![k as f64]).collect();
        let status = pruner
            .add_cuts(&rows, &[0.0; 5], &[true; 5])
            .unwrap();
        assert_eq!(pruner.ncuts(), 3);
        assert_eq!(status.iter().filter(|s| s.is_some()).count(), 3);
        pruner.check_consistency().unwrap();
    }

    #[test]
    fn test_decay_trust_after_idle_steps() {
        let mut pruner = DecayCutPruner::new(
            1,
            Sense::Max,
            Some(3),
            DecayTrust::new(0.9, 0.8, 1.0).unwrap(),
        )
        .unwrap();
        pruner
            .add_cuts(
                &[vec![1.0], vec![2.0], vec![3.0]],
                &[0.0; 3],
                &[true; 3],
            )
            .unwrap();
        for _ in 0..5 {
            pruner.update_stats(&[0.0, 0.0, 0.0]).unwrap();
        }
        let expected = 1.8 * 0.9_f64.powi(5);
        for &value in pruner.get_trust().iter() {
            assert!((value - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_level_one_admission_and_territories() {
        let mut pruner = LevelOneCutPruner::new(
            1,
            Sense::Max,
            Some(2),
            LevelOneTrust::new(),
        )
        .unwrap();
        pruner
            .add_cuts(&[vec![1.0], vec![-1.0]], &[0.0, 2.0], &[true, true])
            .unwrap();
        pruner
            .update_stats(&[vec![-1.0], vec![0.0], vec![1.0], vec![2.0]])
            .unwrap();
        assert_eq!(pruner.get_trust(), &[2.0, 2.0]);
        pruner.check_territories().unwrap();

        // a flat cut beats neither incumbent anywhere sampled
        let status = pruner
            .add_cuts(&[vec![0.0]], &[1.0], &[true])
            .unwrap();
        assert_eq!(status, vec![None]);
        assert_eq!(pruner.ncuts(), 2);
        pruner.check_territories().unwrap();
    }

    #[test]
    fn test_level_one_eviction_rehomes_states() {
        let mut pruner = LevelOneCutPruner::new(
            1,
            Sense::Max,
            Some(2),
            LevelOneTrust::new(),
        )
        .unwrap();
        pruner
            .add_cuts(&[vec![1.0], vec![0.0]], &[0.0, 0.5], &[true, true])
            .unwrap();
        pruner
            .update_stats(&[vec![1.0], vec![2.0], vec![3.0]])
            .unwrap();
        assert_eq!(pruner.get_trust(), &[3.0, 0.0]);

        // the steep cut dominates every state: the idle flat cut is
        // the eviction victim
        let status = pruner
            .add_cuts(&[vec![2.0]], &[0.0], &[true])
            .unwrap();
        assert_eq!(status, vec![Some(1)]);
        assert_eq!(pruner.get_coefficients(1), &[2.0]);
        pruner.check_territories().unwrap();
        // the newcomer now wins everywhere (2x > x for x >= 1)
        assert_eq!(pruner.get_trust(), &[0.0, 3.0]);
    }

    #[test]
    fn test_keep_only_and_remove() {
        let mut pruner = AvgCutPruner::new(
            1,
            Sense::Max,
            None,
            AverageTrust::default(),
        )
        .unwrap();
        pruner
            .add_cuts(
                &[vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
                &[0.0; 4],
                &[true; 4],
            )
            .unwrap();
        pruner.update_stats(&[1.0, 0.0, 1.0, 0.0]).unwrap();

        pruner.keep_only_cuts(&[2, 0]).unwrap();
        assert_eq!(pruner.ncuts(), 2);
        assert_eq!(pruner.get_ids(), &[2, 0]);
        assert_eq!(pruner.get_trust(), &[1.0, 1.0]);

        pruner.remove_cuts(&[0]).unwrap();
        assert_eq!(pruner.get_ids(), &[0]);
        pruner.check_consistency().unwrap();
    }

    #[test]
    fn test_keep_only_rejects_bad_slots() {
        let mut pruner = AvgCutPruner::new(
            1,
            Sense::Max,
            None,
            AverageTrust::default(),
        )
        .unwrap();
        pruner.add_cuts(&[vec![1.0]], &[0.0], &[true]).unwrap();
        assert!(matches!(
            pruner.keep_only_cuts(&[1]),
            Err(PrunerError::Shape(_))
        ));
        assert!(matches!(
            pruner.keep_only_cuts(&[0, 0]),
            Err(PrunerError::Shape(_))
        ));
    }

    #[test]
    fn test_replace_cuts_resets_id_and_trust() {
        let mut pruner = AvgCutPruner::new(
            1,
            Sense::Max,
            None,
            AverageTrust::default(),
        )
        .unwrap();
        pruner
            .add_cuts(&[vec![1.0], vec![2.0]], &[0.0; 2], &[true; 2])
            .unwrap();
        pruner.update_stats(&[1.0, 1.0]).unwrap();
        assert_eq!(pruner.get_trust(), &[1.0, 1.0]);

        pruner
            .replace_cuts(&[0], &[vec![9.0]], &[1.0], &[false])
            .unwrap();
        assert_eq!(pruner.get_ids(), &[2, 1]);
        assert_eq!(pruner.get_coefficients(0), &[9.0]);
        assert_eq!(pruner.get_trust(), &[0.5, 1.0]);
        pruner.check_consistency().unwrap();
    }

    #[test]
    fn test_randomized_operations_keep_invariants() {
        let mut rng = Xoshiro256Plus::seed_from_u64(17);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let offset_dist = Uniform::new(-1.0, 1.0).unwrap();
        let batch_dist = Uniform::try_from(1..4usize).unwrap();

        let mut pruner = AvgCutPruner::new(
            3,
            Sense::Max,
            Some(8),
            AverageTrust::default(),
        )
        .unwrap();
        let mut largest_id_seen = 0;
        for _ in 0..200 {
            let batch = batch_dist.sample(&mut rng);
            let rows: Vec<Vec<f64>> = (0..batch)
                .map(|_| {
                    (0..3).map(|_| normal.sample(&mut rng)).collect()
                })
                .collect();
            let offsets: Vec<f64> = (0..batch)
                .map(|_| offset_dist.sample(&mut rng))
                .collect();
            let flags: Vec<bool> =
                (0..batch).map(|_| rng.random_bool(0.5)).collect();
            pruner.add_cuts(&rows, &offsets, &flags).unwrap();
            pruner.check_consistency().unwrap();
            assert!(pruner.ncuts() <= 8);

            let signal: Vec<f64> = (0..pruner.ncuts())
                .map(|_| {
                    if rng.random_bool(0.5) {
                        normal.sample(&mut rng)
                    } else {
                        0.0
                    }
                })
                .collect();
            pruner.update_stats(&signal).unwrap();

            // the id cursor only moves forward
            let current_largest =
                pruner.get_ids().iter().copied().max().unwrap();
            assert!(current_largest >= largest_id_seen);
            largest_id_seen = current_largest;
        }
    }

    #[test]
    fn test_randomized_level_one_partition() {
        let mut rng = Xoshiro256Plus::seed_from_u64(23);
        let normal = Normal::new(0.0, 1.0).unwrap();

        let mut pruner = LevelOneCutPruner::new(
            2,
            Sense::Max,
            Some(5),
            LevelOneTrust::new(),
        )
        .unwrap();
        for round in 0..50 {
            let rows: Vec<Vec<f64>> = (0..2)
                .map(|_| {
                    (0..2).map(|_| normal.sample(&mut rng)).collect()
                })
                .collect();
            let offsets: Vec<f64> =
                (0..2).map(|_| normal.sample(&mut rng)).collect();
            pruner.add_cuts(&rows, &offsets, &[true, false]).unwrap();
            pruner.check_territories().unwrap();

            let states: Vec<Vec<f64>> = (0..(round % 3))
                .map(|_| {
                    (0..2).map(|_| normal.sample(&mut rng)).collect()
                })
                .collect();
            pruner.update_stats(&states).unwrap();
            pruner.check_territories().unwrap();
        }
    }
}
