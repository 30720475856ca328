use crate::range::{CharIdx, CharLen};

/// Owned text carried by an insertion.
pub type Tendril = String;

/// Represents a single text change operation.
///
/// A change describes replacing the text range `[start, end)` with the optional
/// `replacement` text. If `replacement` is [`None`], this represents a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// The starting character index of the change.
	pub start: CharIdx,
	/// The ending character index of the change (exclusive).
	pub end: CharIdx,
	/// The replacement text, or [`None`] for deletion.
	pub replacement: Option<Tendril>,
}

impl Change {
	/// Inserts `text` at `pos`.
	pub fn insert(pos: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start: pos,
			end: pos,
			replacement: Some(text.into()),
		}
	}

	/// Deletes `[start, end)`.
	pub fn delete(start: CharIdx, end: CharIdx) -> Self {
		Self { start, end, replacement: None }
	}

	/// Replaces `[start, end)` with `text`.
	pub fn replace(start: CharIdx, end: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start,
			end,
			replacement: Some(text.into()),
		}
	}
}

/// Bias determines how positions at change boundaries are mapped.
///
/// A position strictly inside a replaced range maps to the start of the
/// replacement with [`Bias::Left`] and to its end with [`Bias::Right`]. A position
/// at a pure insertion stays before the inserted text with [`Bias::Left`] and
/// moves after it with [`Bias::Right`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// A text insertion with cached character length.
///
/// Fields are private to enforce the invariant that `char_len` always equals
/// `text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	text: Tendril,
	char_len: CharLen,
}

impl Insertion {
	/// Creates a new insertion, computing the character length once.
	#[inline]
	pub fn new(text: Tendril) -> Self {
		let char_len = text.chars().count();
		Self { text, char_len }
	}

	/// Returns true if this insertion is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.char_len == 0
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> CharLen {
		self.char_len
	}

	pub(super) fn push_str(&mut self, other: &Insertion) {
		self.text.push_str(&other.text);
		self.char_len += other.char_len;
	}
}

/// A single operation in a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	/// Retain the next N characters from the source document.
	Retain(CharLen),
	/// Delete the next N characters from the source document.
	Delete(CharLen),
	/// Insert new text at the current position.
	Insert(Insertion),
}

/// One contiguous edited region of a change set.
///
/// `from_a..to_a` is the replaced range in the old document, `from_b..to_b` the
/// text that replaced it in the new document. Adjacent deletions and insertions
/// are reported as a single range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
	/// Start in the old document.
	pub from_a: CharIdx,
	/// End in the old document.
	pub to_a: CharIdx,
	/// Start in the new document.
	pub from_b: CharIdx,
	/// End in the new document.
	pub to_b: CharIdx,
}

impl ChangedRange {
	/// A range that is identical in both documents.
	///
	/// Used to invalidate a region of a tree without an actual edit.
	pub fn unchanged(from: CharIdx, to: CharIdx) -> Self {
		Self {
			from_a: from,
			to_a: to,
			from_b: from,
			to_b: to,
		}
	}

	/// Signed length difference (new minus old).
	pub fn delta(&self) -> isize {
		(self.to_b - self.from_b) as isize - (self.to_a - self.from_a) as isize
	}
}
