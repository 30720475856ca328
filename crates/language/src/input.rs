//! Read access to document text for parsers.

use std::borrow::Cow;

use weft_primitives::{CharIdx, CharLen, Rope};

/// Longest chunk [`DocInput`] hands out, in characters.
pub const MAX_CHUNK: CharLen = 1024;

/// Text source for a parse.
///
/// Positions are character indices. Parsers read forward in small pieces; an
/// implementation is expected to make repeated reads near the same position
/// cheap.
pub trait Input {
	/// Total length in characters.
	fn len(&self) -> CharLen;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns a non-empty run of text starting at `pos`, or `""` at the end.
	///
	/// A chunk may end anywhere, so tokens can continue into the next one.
	fn chunk(&mut self, pos: CharIdx) -> &str;

	/// Returns the text in `from..to`.
	fn read(&mut self, from: CharIdx, to: CharIdx) -> Cow<'_, str>;

	/// Returns true if chunks never extend past the end of a line.
	fn line_chunks(&self) -> bool {
		false
	}
}

/// [`Input`] over a rope snapshot.
///
/// Holds one window of at most [`MAX_CHUNK`] characters that never crosses a
/// line break. A cursor remembers the last char-to-byte lookup in the window,
/// so reading forward costs only the distance moved.
#[derive(Debug, Clone)]
pub struct DocInput {
	doc: Rope,
	cache: String,
	cache_from: CharIdx,
	cache_to: CharIdx,
	/// Last resolved position in the window and its byte offset.
	cursor: (CharIdx, usize),
	loads: usize,
	stepped: usize,
}

impl DocInput {
	pub fn new(doc: Rope) -> Self {
		Self {
			doc,
			cache: String::new(),
			cache_from: 0,
			cache_to: 0,
			cursor: (0, 0),
			loads: 0,
			stepped: 0,
		}
	}

	/// Number of times a window had to be copied out of the rope.
	pub fn loads(&self) -> usize {
		self.loads
	}

	/// Characters walked over to turn positions into byte offsets.
	pub fn stepped(&self) -> usize {
		self.stepped
	}

	fn cached(&self, pos: CharIdx) -> bool {
		self.cache_from <= pos && pos < self.cache_to
	}

	fn load(&mut self, pos: CharIdx) {
		let line = self.doc.char_to_line(pos);
		let line_end = if line + 1 < self.doc.len_lines() {
			self.doc.line_to_char(line + 1)
		} else {
			self.doc.len_chars()
		};
		let to = line_end.min(pos + MAX_CHUNK);

		self.cache.clear();
		self.cache.extend(self.doc.slice(pos..to).chunks());
		self.cache_from = pos;
		self.cache_to = to;
		self.cursor = (pos, 0);
		self.loads += 1;
	}

	/// Byte offset of the character `pos` inside the window. `pos` may be the
	/// window end.
	fn byte_at(&mut self, pos: CharIdx) -> usize {
		let (mut at, mut byte) = if pos >= self.cursor.0 {
			self.cursor
		} else {
			(self.cache_from, 0)
		};
		let mut rest = self.cache[byte..].chars();
		while at < pos {
			let Some(c) = rest.next() else { break };
			byte += c.len_utf8();
			at += 1;
			self.stepped += 1;
		}
		self.cursor = (at, byte);
		byte
	}
}

impl Input for DocInput {
	fn len(&self) -> CharLen {
		self.doc.len_chars()
	}

	fn chunk(&mut self, pos: CharIdx) -> &str {
		debug_assert!(pos <= self.len(), "chunk at {pos} past end {}", self.len());
		if pos >= self.len() {
			return "";
		}
		if !self.cached(pos) {
			self.load(pos);
		}
		let start = self.byte_at(pos);
		&self.cache[start..]
	}

	fn read(&mut self, from: CharIdx, to: CharIdx) -> Cow<'_, str> {
		debug_assert!(from <= to && to <= self.len(), "read {from}..{to} out of bounds");
		if from == to {
			return Cow::Borrowed("");
		}
		if self.cached(from) && to <= self.cache_to {
			let start = self.byte_at(from);
			let end = self.byte_at(to);
			return Cow::Borrowed(&self.cache[start..end]);
		}
		Cow::Owned(self.doc.slice(from..to).to_string())
	}

	fn line_chunks(&self) -> bool {
		true
	}
}
