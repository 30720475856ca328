//! Reusable pieces of previously parsed trees.
//!
//! After an edit, the old tree is not thrown away. It is cut into
//! [`TreeFragment`]s covering the regions the edit did not touch, and the next
//! parse may lift whole nodes out of those fragments instead of re-lexing them.
//!
//! Fragment positions are in the *current* document; `offset` translates them
//! back to positions inside the fragment's tree.

use std::ops::{Deref, Range};
use std::sync::Arc;

use weft_primitives::{CharIdx, ChangedRange};

use crate::tree::Tree;

/// Changes closer together than this drop the fragment between them.
///
/// Tiny fragments rarely contain a reusable node and cost a lookup each.
pub const DEFAULT_MIN_GAP: usize = 128;

/// A region of the current document whose structure can be taken from `tree`.
#[derive(Debug, Clone)]
pub struct TreeFragment {
	from: CharIdx,
	to: CharIdx,
	tree: Tree,
	offset: isize,
	open_start: bool,
	open_end: bool,
}

impl TreeFragment {
	/// Creates a fragment. `offset` maps document positions to tree positions:
	/// `tree_pos = doc_pos + offset`.
	pub fn new(from: CharIdx, to: CharIdx, tree: Tree, offset: isize, open_start: bool, open_end: bool) -> Self {
		debug_assert!(from <= to, "fragment {from}..{to} is inverted");
		Self {
			from,
			to,
			tree,
			offset,
			open_start,
			open_end,
		}
	}

	pub fn from(&self) -> CharIdx {
		self.from
	}

	pub fn to(&self) -> CharIdx {
		self.to
	}

	pub fn range(&self) -> Range<CharIdx> {
		self.from..self.to
	}

	pub fn tree(&self) -> &Tree {
		&self.tree
	}

	pub fn offset(&self) -> isize {
		self.offset
	}

	/// The fragment was cut at its start, so a node starting exactly at `from`
	/// may depend on text that changed.
	pub fn open_start(&self) -> bool {
		self.open_start
	}

	/// The fragment was cut at its end, or its tree was a partial parse.
	pub fn open_end(&self) -> bool {
		self.open_end
	}

	/// Translates a document position into this fragment's tree coordinates.
	///
	/// Returns `None` for positions that fall before the tree's origin.
	pub fn tree_pos(&self, doc_pos: CharIdx) -> Option<CharIdx> {
		usize::try_from(doc_pos as isize + self.offset).ok()
	}

	/// Returns true if a node spanning `from..to` in document coordinates may be
	/// reused from this fragment.
	///
	/// Open edges are exclusive: a node may not start at an open start or end at
	/// an open end.
	pub fn can_reuse(&self, from: CharIdx, to: CharIdx) -> bool {
		let lo = self.from + usize::from(self.open_start);
		let hi = self.to.saturating_sub(usize::from(self.open_end));
		from >= lo && to <= hi && from < to
	}

	/// Puts a freshly parsed tree in front of older fragments.
	///
	/// Fragments that extend past the new tree are kept behind it, so a partial
	/// parse does not discard knowledge about the rest of the document. With
	/// `partial` the new fragment is open at its end.
	pub fn add_tree(tree: &Tree, fragments: &FragmentList, partial: bool) -> FragmentList {
		let mut result = Vec::with_capacity(fragments.len() + 1);
		result.push(TreeFragment::new(0, tree.len(), tree.clone(), 0, false, partial));
		result.extend(fragments.iter().filter(|f| f.to > tree.len()).cloned());
		FragmentList::from(result)
	}

	/// Adjusts fragments to a set of changes, with [`DEFAULT_MIN_GAP`].
	pub fn apply_changes(fragments: &FragmentList, changes: &[ChangedRange]) -> FragmentList {
		Self::apply_changes_with_gap(fragments, changes, DEFAULT_MIN_GAP)
	}

	/// Adjusts fragments to a set of changes.
	///
	/// Every fragment is cut around the changed ranges and shifted into new
	/// document coordinates. Pieces narrower than `min_gap` between two changes
	/// are dropped. Pieces touching a change are open on that side. An empty
	/// change list returns the same list.
	pub fn apply_changes_with_gap(fragments: &FragmentList, changes: &[ChangedRange], min_gap: usize) -> FragmentList {
		if changes.is_empty() {
			return fragments.clone();
		}

		let mut result = Vec::new();
		let mut pending = fragments.iter().peekable();
		let mut pos: CharIdx = 0;
		let mut off: isize = 0;

		for index in 0..=changes.len() {
			let next = changes.get(index);
			let next_pos = next.map_or(usize::MAX, |c| c.from_a);

			if next_pos - pos >= min_gap {
				while let Some(&frag) = pending.peek()
					&& frag.from < next_pos
				{
					if pos >= frag.from || next_pos <= frag.to || off != 0 {
						let from = frag.from.max(pos) as isize - off;
						let to = frag.to.min(next_pos) as isize - off;
						if from < to {
							result.push(TreeFragment::new(
								from as usize,
								to as usize,
								frag.tree.clone(),
								frag.offset + off,
								index > 0 || frag.open_start,
								next.is_some() || frag.open_end,
							));
						}
					} else {
						result.push(frag.clone());
					}

					if frag.to > next_pos {
						break;
					}
					pending.next();
				}
			}

			let Some(change) = next else { break };
			pos = change.to_a;
			off = change.to_a as isize - change.to_b as isize;
		}

		FragmentList::from(result)
	}
}

/// Invalidates `range` without an actual edit.
///
/// Used when a region that was parsed as a placeholder has to be parsed for
/// real. Everything outside `range` stays reusable, however short.
pub fn cut_fragments(fragments: &FragmentList, range: Range<CharIdx>) -> FragmentList {
	TreeFragment::apply_changes_with_gap(fragments, &[ChangedRange::unchanged(range.start, range.end)], 0)
}

/// An ordered, shared list of fragments.
///
/// Cloning is a reference count bump; [`FragmentList::ptr_eq`] tells whether two
/// lists are the same allocation.
#[derive(Debug, Clone)]
pub struct FragmentList(Arc<[TreeFragment]>);

impl FragmentList {
	pub fn new() -> Self {
		Self(Arc::from(Vec::new()))
	}

	pub fn ptr_eq(&self, other: &FragmentList) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Default for FragmentList {
	fn default() -> Self {
		Self::new()
	}
}

impl Deref for FragmentList {
	type Target = [TreeFragment];

	fn deref(&self) -> &[TreeFragment] {
		&self.0
	}
}

impl From<Vec<TreeFragment>> for FragmentList {
	fn from(fragments: Vec<TreeFragment>) -> Self {
		Self(Arc::from(fragments))
	}
}

#[cfg(test)]
mod tests;
