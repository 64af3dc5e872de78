//! Functions under test

use std::collections::{BTreeMap, HashMap};

pub fn sum_values(n: u64) -> u64 {
    (0..n).sum()
}

pub fn sum_squares(n: u64) -> u64 {
    (0..n).map(|x| x * x).sum()
}

pub fn fill_vec(len: usize) -> Vec<u64> {
    (0..len as u64).collect()
}

pub fn build_hash_map(len: usize) -> HashMap<u64, u64> {
    (0..len as u64).map(|k| (k, k * 2)).collect()
}

pub fn build_btree_map(len: usize) -> BTreeMap<u64, u64> {
    (0..len as u64).map(|k| (k, k * 2)).collect()
}

pub fn join_words(words: &[&str], separator: &str) -> String {
    words.join(separator)
}
