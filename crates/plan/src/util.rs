// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeSet, HashMap};

/// Merges every pair of overlapping sets until all sets are disjoint.
pub fn unify<T: Ord + Clone + std::hash::Hash>(sets: impl IntoIterator<Item = BTreeSet<T>>) -> Vec<BTreeSet<T>> {
	let sets: Vec<BTreeSet<T>> = sets.into_iter().collect();
	let mut parent: Vec<usize> = (0..sets.len()).collect();

	fn find(parent: &mut [usize], mut idx: usize) -> usize {
		while parent[idx] != idx {
			parent[idx] = parent[parent[idx]];
			idx = parent[idx];
		}
		idx
	}

	let mut owner: HashMap<&T, usize> = HashMap::new();
	for (idx, set) in sets.iter().enumerate() {
		for item in set {
			match owner.get(item) {
				Some(&other) => {
					let a = find(&mut parent, idx);
					let b = find(&mut parent, other);
					if a != b {
						parent[a.max(b)] = a.min(b);
					}
				}
				None => {
					owner.insert(item, idx);
				}
			}
		}
	}

	let mut merged: Vec<Option<BTreeSet<T>>> = vec![None; sets.len()];
	for (idx, set) in sets.iter().enumerate() {
		let root = find(&mut parent, idx);
		merged[root].get_or_insert_with(BTreeSet::new).extend(set.iter().cloned());
	}
	let mut result: Vec<BTreeSet<T>> = merged.into_iter().flatten().filter(|s| !s.is_empty()).collect();
	result.sort();
	result
}

/// Cartesian product of the given lists, in lexicographic order of positions.
pub fn cartesian<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
	let mut result: Vec<Vec<T>> = vec![vec![]];
	for list in lists {
		let mut next = Vec::with_capacity(result.len() * list.len());
		for prefix in &result {
			for item in list {
				let mut combined = prefix.clone();
				combined.push(item.clone());
				next.push(combined);
			}
		}
		result = next;
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(items: &[&'static str]) -> BTreeSet<&'static str> {
		items.iter().copied().collect()
	}

	#[test]
	fn test_unify_transitive() {
		let result = unify([set(&["a", "b"]), set(&["c"]), set(&["b", "d"]), set(&["d", "e"])]);
		assert_eq!(result, vec![set(&["a", "b", "d", "e"]), set(&["c"])]);
	}

	#[test]
	fn test_unify_disjoint_untouched() {
		let result = unify([set(&["x"]), set(&["y"])]);
		assert_eq!(result, vec![set(&["x"]), set(&["y"])]);
	}

	#[test]
	fn test_cartesian() {
		let result = cartesian(&[vec![1, 2], vec![3], vec![4, 5]]);
		assert_eq!(result, vec![vec![1, 3, 4], vec![1, 3, 5], vec![2, 3, 4], vec![2, 3, 5]]);
		assert_eq!(cartesian::<i32>(&[]), vec![Vec::<i32>::new()]);
		assert!(cartesian(&[vec![1], vec![]]).is_empty());
	}
}
