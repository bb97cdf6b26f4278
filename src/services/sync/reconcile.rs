use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::ports::spotify::Item;

/// Outcome of comparing a playlist's current membership against the desired
/// one. Submission order to the batch mutator is exactly the order here.
#[derive(Debug, Default)]
pub struct Diff {
    pub to_add: Vec<Item>,
    pub to_remove: Vec<Item>,
}

/// Computes what to change so the playlist ends up holding `desired`.
///
/// Without shuffle this is the minimal diff: add what's missing (desired
/// order), remove what no longer belongs (current order). With shuffle the
/// whole playlist is rebuilt: everything currently in it is removed and the
/// full desired list is re-added in a fresh random permutation.
pub fn reconcile(current: &[Item], desired: &[Item], shuffle: bool) -> Diff {
    if shuffle {
        let mut to_add = desired.to_vec();
        to_add.shuffle(&mut rand::thread_rng());
        return Diff {
            to_add,
            to_remove: current.to_vec(),
        };
    }

    let current_ids: HashSet<&str> = current.iter().map(|t| t.id.as_str()).collect();
    let desired_ids: HashSet<&str> = desired.iter().map(|t| t.id.as_str()).collect();

    Diff {
        to_add: desired
            .iter()
            .filter(|t| !current_ids.contains(t.id.as_str()))
            .cloned()
            .collect(),
        to_remove: current
            .iter()
            .filter(|t| !desired_ids.contains(t.id.as_str()))
            .cloned()
            .collect(),
    }
}
