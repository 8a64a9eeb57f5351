//! Drives a pruner built from `example/pruner.json` through a loop of
//! random cut batches and optimization signals, printing the admission
//! table as the pool fills and starts evicting.

use cutpruner::config::{self, BuiltPruner};
use cutpruner::log;
use rand::prelude::*;
use rand_distr::{Normal, Uniform};
use rand_xoshiro::Xoshiro256Plus;
use std::time::Instant;

const NUM_BATCHES: usize = 24;

fn random_batch(
    rng: &mut Xoshiro256Plus,
    dimension: usize,
    size: usize,
) -> (Vec<Vec<f64>>, Vec<f64>, Vec<bool>) {
    let gradient = Normal::new(0.0, 1.0).unwrap();
    let offset = Uniform::new(-1.0, 1.0).unwrap();
    let rows: Vec<Vec<f64>> = (0..size)
        .map(|_| (0..dimension).map(|_| gradient.sample(rng)).collect())
        .collect();
    let offsets: Vec<f64> = (0..size).map(|_| offset.sample(rng)).collect();
    let is_my_cut: Vec<bool> =
        (0..size).map(|_| rng.random_bool(0.7)).collect();
    (rows, offsets, is_my_cut)
}

fn random_duals(rng: &mut Xoshiro256Plus, ncuts: usize) -> Vec<f64> {
    let dual = Normal::new(0.0, 1.0).unwrap();
    (0..ncuts)
        .map(|_| {
            if rng.random_bool(0.4) {
                dual.sample(rng)
            } else {
                0.0
            }
        })
        .collect()
}

fn random_states(
    rng: &mut Xoshiro256Plus,
    dimension: usize,
    count: usize,
) -> Vec<Vec<f64>> {
    let coordinate = Uniform::new(-2.0, 2.0).unwrap();
    (0..count)
        .map(|_| (0..dimension).map(|_| coordinate.sample(rng)).collect())
        .collect()
}

fn main() {
    let input = config::read_pruner_input("example/pruner.json");
    let mut pruner = input.build_pruner().unwrap();

    let begin = Instant::now();
    log::pruning_greeting(
        input.dimension,
        pruner_capacity(input.max_cuts),
        NUM_BATCHES,
    );
    log::admission_table_divider();
    log::admission_table_header();
    log::admission_table_divider();

    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let batch_size = Uniform::try_from(1..6usize).unwrap();
    for batch in 0..NUM_BATCHES {
        let size = batch_size.sample(&mut rng);
        let (rows, offsets, is_my_cut) =
            random_batch(&mut rng, input.dimension, size);
        let status = pruner.add_cuts(&rows, &offsets, &is_my_cut).unwrap();
        let admitted = status.iter().filter(|entry| entry.is_some()).count();

        match &mut pruner {
            BuiltPruner::Average(pruner) => {
                let duals = random_duals(&mut rng, pruner.ncuts());
                pruner.update_stats(&duals).unwrap();
            }
            BuiltPruner::Decay(pruner) => {
                let duals = random_duals(&mut rng, pruner.ncuts());
                pruner.update_stats(&duals).unwrap();
            }
            BuiltPruner::LevelOne(pruner) => {
                let states = random_states(&mut rng, input.dimension, 2);
                pruner.update_stats(&states).unwrap();
            }
        }

        log::admission_table_row(
            batch + 1,
            size,
            admitted,
            size - admitted,
            pruner.ncuts(),
        );
    }
    log::admission_table_divider();
    log::pruning_duration(begin.elapsed());
}

fn pruner_capacity(max_cuts: i64) -> Option<usize> {
    if max_cuts == -1 {
        None
    } else {
        Some(max_cuts as usize)
    }
}
