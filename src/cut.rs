use crate::error::PrunerError;

/// The inequality sense shared by every cut in a pool.
///
/// `Min` and `Max` describe piecewise-linear functions (the cut offset
/// enters the evaluated height), while `Leq` and `Geq` describe
/// half-spaces of a polyhedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Min,
    Max,
    Leq,
    Geq,
}

impl Sense {
    /// Parses a sense from its configuration name.
    pub fn from_name(name: &str) -> Result<Self, PrunerError> {
        match name {
            "min" => Ok(Sense::Min),
            "max" => Ok(Sense::Max),
            "leq" => Ok(Sense::Leq),
            "geq" => Ok(Sense::Geq),
            _ => Err(PrunerError::Configuration(format!(
                "unknown sense '{}'",
                name
            ))),
        }
    }

    /// True when cuts describe a piecewise-linear function rather than
    /// a polyhedron.
    pub fn is_function(&self) -> bool {
        matches!(self, Sense::Min | Sense::Max)
    }

    /// True for the `>=` / `max` direction.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, Sense::Max | Sense::Geq)
    }
}

/// Owns the cut matrix, the offsets and the per-cut ids.
///
/// Ids are stamped from a strictly increasing per-pool cursor and are
/// never reused: a smaller id always means a strictly older cut, and a
/// replaced slot receives a fresh id so it becomes the youngest. Ids
/// are the only age signal the pruner consults.
#[derive(Debug)]
pub struct CutStore {
    dimension: usize,
    sense: Sense,
    coefficients: Vec<Vec<f64>>,
    offsets: Vec<f64>,
    ids: Vec<usize>,
    id_cursor: usize,
}

impl CutStore {
    pub fn new(dimension: usize, sense: Sense) -> Self {
        Self {
            dimension,
            sense,
            coefficients: vec![],
            offsets: vec![],
            ids: vec![],
            id_cursor: 0,
        }
    }

    pub fn ncuts(&self) -> usize {
        self.offsets.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn coefficients(&self, slot: usize) -> &[f64] {
        self.coefficients[slot].as_slice()
    }

    pub fn offset(&self, slot: usize) -> f64 {
        self.offsets[slot]
    }

    pub fn ids(&self) -> &[usize] {
        self.ids.as_slice()
    }

    pub fn id_cursor(&self) -> usize {
        self.id_cursor
    }

    fn next_id(&mut self) -> usize {
        let id = self.id_cursor;
        self.id_cursor += 1;
        id
    }

    /// Extends the pool with the given rows, stamping fresh ids.
    pub fn append(&mut self, rows: &[Vec<f64>], offsets: &[f64]) {
        assert_eq!(rows.len(), offsets.len());
        for (row, offset) in rows.iter().zip(offsets.iter()) {
            assert_eq!(row.len(), self.dimension);
            let id = self.next_id();
            self.coefficients.push(row.clone());
            self.offsets.push(*offset);
            self.ids.push(id);
        }
    }

    /// Overwrites the given slots with new rows. Each replaced slot is
    /// stamped with a fresh id, making it the youngest cut in the pool.
    pub fn replace_at(
        &mut self,
        slots: &[usize],
        rows: &[Vec<f64>],
        offsets: &[f64],
    ) {
        assert_eq!(slots.len(), rows.len());
        assert_eq!(slots.len(), offsets.len());
        for ((&slot, row), offset) in
            slots.iter().zip(rows.iter()).zip(offsets.iter())
        {
            assert_eq!(row.len(), self.dimension);
            let id = self.next_id();
            self.coefficients[slot] = row.clone();
            self.offsets[slot] = *offset;
            self.ids[slot] = id;
        }
    }

    /// Projects the pool onto the given slots, in the given order.
    pub fn keep_only(&mut self, kept: &[usize]) {
        self.coefficients = kept
            .iter()
            .map(|&slot| self.coefficients[slot].clone())
            .collect();
        self.offsets = kept.iter().map(|&slot| self.offsets[slot]).collect();
        self.ids = kept.iter().map(|&slot| self.ids[slot]).collect();
    }

    /// Drops the given slots, keeping the remaining cuts in order.
    pub fn remove_at(&mut self, slots: &[usize]) {
        let mut removed = vec![false; self.ncuts()];
        for &slot in slots.iter() {
            removed[slot] = true;
        }
        let kept: Vec<usize> =
            (0..self.ncuts()).filter(|&slot| !removed[slot]).collect();
        self.keep_only(&kept);
    }
}
