use crate::cut::CutStore;
use crate::error::PrunerError;

/// A dual multiplier below this magnitude counts as an unused cut in
/// the optimization step being reported.
const USAGE_TOLERANCE: f64 = 1e-6;

/// A scoring policy for the cuts of a pool.
///
/// The pruner owns the trust vector and keeps it aligned with the cut
/// store; the policy owns whatever per-cut bookkeeping its rule needs.
/// Hooks are called after the store has been updated: `on_append` with
/// the new cuts already present, `on_replace` with the new rows already
/// installed, and `on_keep_only` with both the store and the trust
/// vector already projected onto `kept`.
pub trait TrustModel {
    /// The observation fed to `update_stats`: dual multipliers aligned
    /// with the current cuts, or a batch of visited states.
    type Signal: ?Sized;

    /// The trust granted to a cut at birth.
    fn initial_trust(&self, is_my_cut: bool) -> f64;

    fn on_append(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        is_my_cut: &[bool],
    );

    fn on_replace(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        slots: &[usize],
        is_my_cut: &[bool],
    );

    fn on_keep_only(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        kept: &[usize],
    );

    fn update_stats(
        &mut self,
        store: &CutStore,
        trust: &mut Vec<f64>,
        signal: &Self::Signal,
    ) -> Result<(), PrunerError>;

    /// Whether the cut at `slot` beats a hypothetical newly generated
    /// cut with the given my-cut flag.
    fn is_better(
        &self,
        trust: &[f64],
        slot: usize,
        hypothetical_my_cut: bool,
    ) -> bool {
        trust[slot] > self.initial_trust(hypothetical_my_cut)
    }
}

/// Shared eviction comparator for the counter-based policies: an
/// equal-trust incumbent survives a foreign newcomer but yields to a
/// freshly generated my-cut.
fn counter_is_better(
    trust: &[f64],
    slot: usize,
    threshold: f64,
    hypothetical_my_cut: bool,
) -> bool {
    if hypothetical_my_cut {
        trust[slot] > threshold
    } else {
        trust[slot] >= threshold
    }
}

/// Scores each cut by the fraction of reported optimization steps in
/// which its dual multiplier was active.
#[derive(Debug)]
pub struct AverageTrust {
    new_cut_trust: f64,
    my_cut_bonus: f64,
    n_used: Vec<usize>,
    n_with: Vec<usize>,
    is_mine: Vec<bool>,
}

impl AverageTrust {
    pub fn new(
        new_cut_trust: f64,
        my_cut_bonus: f64,
    ) -> Result<Self, PrunerError> {
        if !(0.0..=1.0).contains(&new_cut_trust) {
            return Err(PrunerError::Configuration(format!(
                "new cut trust {} outside [0, 1]",
                new_cut_trust
            )));
        }
        Ok(Self {
            new_cut_trust,
            my_cut_bonus,
            n_used: vec![],
            n_with: vec![],
            is_mine: vec![],
        })
    }

    pub fn default() -> Self {
        Self::new(0.5, 0.0).unwrap()
    }

    fn cut_trust(&self, slot: usize) -> f64 {
        let base = if self.n_with[slot] == 0 {
            self.new_cut_trust
        } else {
            self.n_used[slot] as f64 / self.n_with[slot] as f64
        };
        let bonus = if self.is_mine[slot] { self.my_cut_bonus } else { 0.0 };
        base + bonus
    }
}

impl TrustModel for AverageTrust {
    type Signal = [f64];

    fn initial_trust(&self, is_my_cut: bool) -> f64 {
        self.new_cut_trust + if is_my_cut { self.my_cut_bonus } else { 0.0 }
    }

    fn on_append(
        &mut self,
        _store: &CutStore,
        trust: &mut Vec<f64>,
        is_my_cut: &[bool],
    ) {
        for &my in is_my_cut.iter() {
            self.n_used.push(0);
            self.n_with.push(0);
            self.is_mine.push(my);
            trust.push(self.initial_trust(my));
        }
    }

    fn on_replace(
        &mut self,
        _store: &CutStore,
        trust: &mut Vec<f64>,
        slots: &[usize],
        is_my_cut: &[bool],
    ) {
        for (&slot, &my) in slots.iter().zip(is_my_cut.iter()) {
            self.n_used[slot] = 0;
            self.n_with[slot] = 0;
            self.is_mine[slot] = my;
            trust[slot] = self.initial_trust(my);
        }
    }

    fn on_keep_only(
        &mut self,
        _store: &CutStore,
        _trust: &mut Vec<f64>,
        kept: &[usize],
    ) {
        self.n_used = kept.iter().map(|&slot| self.n_used[slot]).collect();
        self.n_with = kept.iter().map(|&slot| self.n_with[slot]).collect();
        self.is_mine = kept.iter().map(|&slot| self.is_mine[slot]).collect();
    }

    fn update_stats(
        &mut self,
        _store: &CutStore,
        trust: &mut Vec<f64>,
        signal: &[f64],
    ) -> Result<(), PrunerError> {
        if signal.len() != trust.len() {
            return Err(PrunerError::Shape(format!(
                "signal has {} entries for {} cuts",
                signal.len(),
                trust.len()
            )));
        }
        for (slot, multiplier) in signal.iter().enumerate() {
            self.n_with[slot] += 1;
            if multiplier.abs() > USAGE_TOLERANCE {
                self.n_used[slot] += 1;
            }
            trust[slot] = self.cut_trust(slot);
        }
        Ok(())
    }

    fn is_better(
        &self,
        trust: &[f64],
        slot: usize,
        hypothetical_my_cut: bool,
    ) -> bool {
        counter_is_better(
            trust,
            slot,
            self.initial_trust(hypothetical_my_cut),
            hypothetical_my_cut,
        )
    }
}

/// Scores each cut by an exponentially decayed count of the steps in
/// which its dual multiplier was active.
#[derive(Debug)]
pub struct DecayTrust {
    lambda: f64,
    new_cut_trust: f64,
    my_cut_bonus: f64,
}

impl DecayTrust {
    pub fn new(
        lambda: f64,
        new_cut_trust: f64,
        my_cut_bonus: f64,
    ) -> Result<Self, PrunerError> {
        if lambda <= 0.0 || lambda >= 1.0 {
            return Err(PrunerError::Configuration(format!(
                "decay factor {} outside (0, 1)",
                lambda
            )));
        }
        Ok(Self {
            lambda,
            new_cut_trust,
            my_cut_bonus,
        })
    }

    pub fn default() -> Self {
        Self::new(0.9, 0.5, 0.0).unwrap()
    }
}

impl TrustModel for DecayTrust {
    type Signal = [f64];

    fn initial_trust(&self, is_my_cut: bool) -> f64 {
        self.new_cut_trust + if is_my_cut { self.my_cut_bonus } else { 0.0 }
    }

    fn on_append(
        &mut self,
        _store: &CutStore,
        trust: &mut Vec<f64>,
        is_my_cut: &[bool],
    ) {
        for &my in is_my_cut.iter() {
            trust.push(self.initial_trust(my));
        }
    }

    fn on_replace(
        &mut self,
        _store: &CutStore,
        trust: &mut Vec<f64>,
        slots: &[usize],
        is_my_cut: &[bool],
    ) {
        for (&slot, &my) in slots.iter().zip(is_my_cut.iter()) {
            trust[slot] = self.initial_trust(my);
        }
    }

    fn on_keep_only(
        &mut self,
        _store: &CutStore,
        _trust: &mut Vec<f64>,
        _kept: &[usize],
    ) {
    }

    fn update_stats(
        &mut self,
        _store: &CutStore,
        trust: &mut Vec<f64>,
        signal: &[f64],
    ) -> Result<(), PrunerError> {
        if signal.len() != trust.len() {
            return Err(PrunerError::Shape(format!(
                "signal has {} entries for {} cuts",
                signal.len(),
                trust.len()
            )));
        }
        for (slot, multiplier) in signal.iter().enumerate() {
            trust[slot] *= self.lambda;
            if multiplier.abs() > USAGE_TOLERANCE {
                trust[slot] += 1.0;
            }
        }
        Ok(())
    }

    fn is_better(
        &self,
        trust: &[f64],
        slot: usize,
        hypothetical_my_cut: bool,
    ) -> bool {
        counter_is_better(
            trust,
            slot,
            self.initial_trust(hypothetical_my_cut),
            hypothetical_my_cut,
        )
    }
}
