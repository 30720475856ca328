use pretty_assertions::assert_eq;
use proptest::prelude::*;
use weft_primitives::{Bias, Change, ChangeSet};

use super::*;
use crate::tree::NodeType;

const DOC: NodeType = NodeType::new(1, "Doc");

fn whole(len: usize) -> FragmentList {
	TreeFragment::add_tree(&Tree::leaf(DOC, len), &FragmentList::new(), false)
}

fn shape(fragments: &FragmentList) -> Vec<(usize, usize, isize, bool, bool)> {
	fragments
		.iter()
		.map(|f| (f.from(), f.to(), f.offset(), f.open_start(), f.open_end()))
		.collect()
}

fn ranges(len: usize, changes: Vec<Change>) -> (ChangeSet, Vec<ChangedRange>) {
	let cs = ChangeSet::from_changes(len, changes);
	let ranges = cs.changed_ranges().collect();
	(cs, ranges)
}

/// A partial tree is open at its end and keeps older fragments reaching past it.
#[test]
fn add_tree_keeps_fragments_past_partial_tree() {
	let old = whole(500);
	let (_, changes) = ranges(500, vec![Change::insert(400, "abc")]);
	let cut = TreeFragment::apply_changes(&old, &changes);
	let fresh = TreeFragment::add_tree(&Tree::leaf(DOC, 200), &cut, true);

	assert_eq!(fresh[0].range(), 0..200);
	assert!(fresh[0].open_end());
	assert!(fresh.iter().skip(1).all(|f| f.to() > 200));
	assert_eq!(fresh.last().map(|f| f.range()), Some(403..503));
}

/// Insertion in the middle splits the tree into two open pieces.
#[test]
fn insertion_splits_fragment() {
	let (_, changes) = ranges(100, vec![Change::insert(40, "hello")]);
	let cut = TreeFragment::apply_changes_with_gap(&whole(100), &changes, 0);

	assert_eq!(shape(&cut), vec![(0, 40, 0, false, true), (45, 105, -5, true, false)]);
	assert_eq!(cut[1].tree_pos(45), Some(40));
}

#[test]
fn empty_change_list_returns_same_list() {
	let frags = whole(10);
	let same = TreeFragment::apply_changes(&frags, &[]);
	assert!(same.ptr_eq(&frags));
}

/// With the default gap, pieces squeezed between nearby changes are dropped.
#[test]
fn default_gap_drops_narrow_pieces() {
	let (_, changes) = ranges(1000, vec![Change::insert(10, "x"), Change::delete(50, 60)]);

	let coarse = TreeFragment::apply_changes(&whole(1000), &changes);
	assert_eq!(shape(&coarse), vec![(51, 991, 9, true, false)]);

	let exact = TreeFragment::apply_changes_with_gap(&whole(1000), &changes, 0);
	assert_eq!(exact.len(), 3);
}

#[test]
fn cut_fragments_opens_both_sides() {
	let cut = cut_fragments(&whole(1000), 200..300);
	assert_eq!(shape(&cut), vec![(0, 200, 0, false, true), (300, 1000, 0, true, false)]);
}

/// A change covering a whole fragment removes it.
#[test]
fn covering_change_removes_fragment() {
	let frags = FragmentList::from(vec![
		TreeFragment::new(0, 300, Tree::leaf(DOC, 300), 0, false, false),
		TreeFragment::new(300, 600, Tree::leaf(DOC, 300), -300, false, false),
	]);
	let (_, changes) = ranges(600, vec![Change::delete(300, 600)]);
	let cut = TreeFragment::apply_changes(&frags, &changes);
	assert_eq!(shape(&cut), vec![(0, 300, 0, false, true)]);
}

#[test]
fn reuse_respects_open_edges() {
	let frag = TreeFragment::new(10, 20, Tree::leaf(DOC, 30), 0, true, true);
	assert!(!frag.can_reuse(10, 12));
	assert!(frag.can_reuse(11, 19));
	assert!(!frag.can_reuse(15, 20));

	let closed = TreeFragment::new(10, 20, Tree::leaf(DOC, 30), 0, false, false);
	assert!(closed.can_reuse(10, 20));
}

fn edits() -> impl Strategy<Value = (usize, Vec<Change>)> {
	(1usize..400).prop_flat_map(|len| {
		let change = (0..=len, 0usize..20, "[a-z]{0,6}");
		(Just(len), prop::collection::vec(change, 1..5))
	})
	.prop_map(|(len, raw)| {
		let mut starts: Vec<(usize, usize, String)> = raw;
		starts.sort_by_key(|c| c.0);
		let mut changes = Vec::new();
		let mut pos = 0;
		for (start, span, text) in starts {
			if start < pos {
				continue;
			}
			let end = (start + span).min(len);
			changes.push(Change::replace(start, end, text));
			pos = end;
		}
		(len, changes)
	})
}

proptest! {
	/// Every position covered by an exact fragment maps back to unchanged text.
	#[test]
	fn prop_exact_fragments_cover_only_unchanged_text((len, changes) in edits()) {
		let (cs, changed) = ranges(len, changes);
		let cut = TreeFragment::apply_changes_with_gap(&whole(len), &changed, 0);

		for frag in cut.iter() {
			prop_assert!(frag.from() < frag.to());
			for pos in frag.range() {
				let old = frag.tree_pos(pos).expect("fragment positions map into the tree");
				prop_assert!(old < len);
				prop_assert!(changed.iter().all(|c| !(c.from_a..c.to_a).contains(&old)));
				prop_assert!(changed.iter().all(|c| !(c.from_b..c.to_b).contains(&pos)));
				prop_assert_eq!(cs.map_pos(old, Bias::Right), pos);
			}
		}

		for window in cut.windows(2) {
			prop_assert!(window[0].to() <= window[1].from());
		}
	}
}
