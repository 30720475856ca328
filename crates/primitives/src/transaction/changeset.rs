use std::iter::Peekable;
use std::slice;

use super::types::{Bias, Change, ChangedRange, Insertion, Operation, Tendril};
use crate::Rope;
use crate::range::{CharIdx, CharLen};

/// A sequence of operations representing a set of changes to a document.
///
/// The operations cover the source document exactly once: the retained and
/// deleted lengths sum to [`ChangeSet::len`]. An empty changeset (no operations)
/// is accepted as an identity over any document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	changes: Vec<Operation>,
	len: usize,
	len_after: usize,
}

impl ChangeSet {
	/// A changeset that keeps a document of `len` characters untouched.
	pub fn identity(len: CharLen) -> Self {
		let mut cs = Self::default();
		cs.retain(len);
		cs
	}

	/// Builds a changeset from ordered, non-overlapping changes against a
	/// document of `len` characters.
	///
	/// # Panics
	///
	/// Panics if the changes are out of order, overlap, or exceed `len`.
	pub fn from_changes(len: CharLen, changes: impl IntoIterator<Item = Change>) -> Self {
		let mut cs = Self::default();
		let mut pos = 0;
		for change in changes {
			assert!(
				pos <= change.start && change.start <= change.end && change.end <= len,
				"change {}..{} out of order or beyond document length {len}",
				change.start,
				change.end
			);
			cs.retain(change.start - pos);
			if let Some(text) = change.replacement {
				cs.insert(text);
			}
			cs.delete(change.end - change.start);
			pos = change.end;
		}
		cs.retain(len - pos);
		cs
	}

	/// Returns the length of the source document (before changes).
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns the length of the document after applying changes.
	pub fn len_after(&self) -> usize {
		self.len_after
	}

	/// Returns true if this changeset contains no operations.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Returns true if applying this changeset leaves any document unchanged.
	pub fn is_identity(&self) -> bool {
		self.changes.iter().all(|op| matches!(op, Operation::Retain(_)))
	}

	/// Returns a slice of all operations in this changeset.
	pub fn changes(&self) -> &[Operation] {
		&self.changes
	}

	/// Appends a retain of `n` characters. Consecutive retains merge.
	pub fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;
		self.len_after += n;

		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	/// Appends a deletion of `n` characters. Consecutive deletions merge.
	pub fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;

		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	/// Appends an insertion at the current position.
	///
	/// Inserts are kept ahead of an adjacent delete so that a replacement always
	/// reads as `Insert, Delete`.
	pub fn insert(&mut self, text: Tendril) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		self.len_after += ins.char_len();

		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.push_str(&ins);
			}
			[.., last @ Operation::Delete(_)] => {
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document, modifying it in place.
	pub fn apply(&self, doc: &mut Rope) {
		if self.changes.is_empty() {
			return;
		}
		debug_assert_eq!(self.len, doc.len_chars(), "changeset applied to a document of the wrong length");

		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					pos += n;
				}
				Operation::Delete(n) => {
					doc.remove(pos..pos + n);
				}
				Operation::Insert(ins) => {
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
	}

	/// Iterates the edited regions in document order.
	pub fn changed_ranges(&self) -> ChangedRanges<'_> {
		ChangedRanges {
			ops: self.changes.iter().peekable(),
			pos_a: 0,
			pos_b: 0,
		}
	}

	/// Maps a position in the old document to the new document.
	///
	/// Positions before every change are unchanged; positions after a change
	/// shift by its length difference. A position at the start of a replaced
	/// range maps to the start of the replacement, a position at its end maps to
	/// the end of the replacement. See [`Bias`] for the remaining cases.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut end_a = 0;
		let mut end_b = 0;

		for range in self.changed_ranges() {
			if range.from_a > pos {
				break;
			}

			let pure_insert = range.from_a == range.to_a;
			if pos < range.to_a || (pure_insert && pos == range.from_a && bias == Bias::Left) {
				return if pos == range.from_a || bias == Bias::Left {
					range.from_b
				} else {
					range.to_b
				};
			}

			end_a = range.to_a;
			end_b = range.to_b;
		}

		pos - end_a + end_b
	}
}

/// Iterator over the [`ChangedRange`]s of a [`ChangeSet`].
#[derive(Debug, Clone)]
pub struct ChangedRanges<'a> {
	ops: Peekable<slice::Iter<'a, Operation>>,
	pos_a: CharIdx,
	pos_b: CharIdx,
}

impl Iterator for ChangedRanges<'_> {
	type Item = ChangedRange;

	fn next(&mut self) -> Option<ChangedRange> {
		let mut current: Option<ChangedRange> = None;

		while let Some(op) = self.ops.peek() {
			match op {
				Operation::Retain(n) => {
					if current.is_some() {
						break;
					}
					self.pos_a += n;
					self.pos_b += n;
				}
				Operation::Delete(n) => {
					let range = current.get_or_insert(empty_at(self.pos_a, self.pos_b));
					self.pos_a += n;
					range.to_a = self.pos_a;
				}
				Operation::Insert(ins) => {
					let range = current.get_or_insert(empty_at(self.pos_a, self.pos_b));
					self.pos_b += ins.char_len();
					range.to_b = self.pos_b;
				}
			}
			self.ops.next();
		}

		current
	}
}

fn empty_at(pos_a: CharIdx, pos_b: CharIdx) -> ChangedRange {
	ChangedRange {
		from_a: pos_a,
		to_a: pos_a,
		from_b: pos_b,
		to_b: pos_b,
	}
}
