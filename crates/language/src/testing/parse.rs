use std::ops::Range;

use weft_primitives::range::overlaps;

use super::kinds::*;
use super::*;
use crate::fragment::TreeFragment;
use crate::parser::ParseScope;
use crate::tree::{Child, NodeType, Tree};

/// Nodes that depend only on their own text and can be lifted out of a fragment.
const REUSABLE: [NodeType; 7] = [WORD, NUMBER, PUNCT, SPACE, BLOCK, FENCE, LAZY_FENCE];

enum Lexeme {
	Token(NodeType, usize),
	Open(char),
	Close(char),
	Fence(usize),
}

impl Lexeme {
	/// Token kind and length with brackets and fences read as punctuation.
	fn plain(self) -> (NodeType, usize) {
		match self {
			Lexeme::Token(kind, len) => (kind, len),
			Lexeme::Open(_) | Lexeme::Close(_) => (PUNCT, 1),
			Lexeme::Fence(run) => (PUNCT, run),
		}
	}
}

/// Number of characters matching `pred` from `pos` on, following the run into
/// later chunks.
fn run_from(input: &mut dyn Input, pos: CharIdx, mut pred: impl FnMut(char) -> bool) -> usize {
	let mut len = 0;
	loop {
		let chunk = input.chunk(pos + len);
		if chunk.is_empty() {
			return len;
		}
		let mut whole = true;
		for c in chunk.chars() {
			if !pred(c) {
				whole = false;
				break;
			}
			len += 1;
		}
		if !whole {
			return len;
		}
	}
}

fn lex(input: &mut dyn Input, pos: CharIdx) -> Lexeme {
	let Some(first) = input.chunk(pos).chars().next() else {
		return Lexeme::Token(PUNCT, 0);
	};
	match first {
		c if c.is_whitespace() => {
			// Whitespace ends with the line it is on.
			let mut line_end = false;
			let len = run_from(input, pos, |c| {
				let take = !line_end && c.is_whitespace();
				line_end |= c == '\n';
				take
			});
			Lexeme::Token(SPACE, len)
		}
		c if c.is_alphabetic() || c == '_' => Lexeme::Token(WORD, 1 + run_from(input, pos + 1, |c| c.is_alphanumeric() || c == '_')),
		c if c.is_ascii_digit() => Lexeme::Token(NUMBER, run_from(input, pos, |c| c.is_ascii_digit())),
		'(' | '[' | '{' => Lexeme::Open(first),
		')' | ']' | '}' => Lexeme::Close(first),
		'`' => match run_from(input, pos, |c| c == '`') {
			run if run >= 3 => Lexeme::Fence(run),
			run => Lexeme::Token(PUNCT, run),
		},
		_ => Lexeme::Token(PUNCT, 1),
	}
}

fn closer_for(open: char) -> char {
	match open {
		'(' => ')',
		'[' => ']',
		_ => '}',
	}
}

/// Finds the next run of three or more backticks at or after `from`.
fn find_fence_close(input: &mut dyn Input, from: CharIdx) -> Option<(CharIdx, usize)> {
	let mut pos = from;
	while pos < input.len() {
		let (tick, len) = {
			let chunk = input.chunk(pos);
			(chunk.chars().position(|c| c == '`'), chunk.chars().count())
		};
		let Some(offset) = tick else {
			pos += len.max(1);
			continue;
		};
		let at = pos + offset;
		let run = run_from(input, at, |c| c == '`');
		if run >= 3 {
			return Some((at, run));
		}
		pos = at + run;
	}
	None
}

fn node(kind: NodeType, start: CharIdx, end: CharIdx, children: Vec<(CharIdx, Tree)>) -> Tree {
	let children = children
		.into_iter()
		.map(|(at, tree)| Child { offset: at - start, tree })
		.collect();
	Tree::new(kind, end - start, children)
}

struct Frame {
	start: CharIdx,
	closer: Option<char>,
	children: Vec<(CharIdx, Tree)>,
}

impl Frame {
	fn new(start: CharIdx, closer: Option<char>) -> Self {
		Self {
			start,
			closer,
			children: Vec::new(),
		}
	}
}

pub(super) struct BraceParse {
	config: BraceParser,
	input: Box<dyn Input + Send>,
	fragments: FragmentList,
	to: CharIdx,
	pos: CharIdx,
	/// Open frames; index 0 is the document.
	stack: Vec<Frame>,
	stopped_at: Option<CharIdx>,
	done: Option<Tree>,
}

impl BraceParse {
	pub(super) fn new(config: BraceParser, input: Box<dyn Input + Send>, fragments: FragmentList, ranges: &[Range<CharIdx>]) -> Self {
		let from = ranges.first().map_or(0, |r| r.start);
		let to = ranges.last().map_or(input.len(), |r| r.end).min(input.len());
		Self {
			config,
			input,
			fragments,
			to,
			pos: from,
			stack: vec![Frame::new(from, None)],
			stopped_at: None,
			done: None,
		}
	}

	fn end(&self) -> CharIdx {
		self.stopped_at.map_or(self.to, |stop| stop.min(self.to))
	}

	fn push(&mut self, start: CharIdx, tree: Tree) {
		if let Some(frame) = self.stack.last_mut() {
			frame.children.push((start, tree));
		}
	}

	fn reuse(&mut self, scope: &mut dyn ParseScope) -> bool {
		let pos = self.pos;
		let limit = self.end();
		let viewport = scope.viewport();
		let found = self
			.fragments
			.iter()
			.filter(|f| f.from() <= pos && pos < f.to())
			.find_map(|f| reusable_node(f, pos, limit, &viewport));
		let Some(tree) = found else {
			return false;
		};

		let end = pos + tree.len();
		if tree.kind() == LAZY_FENCE {
			scope.skip_until_in_view(pos, end);
		}
		self.config.stats.record_reuse(tree.len());
		self.push(pos, tree);
		self.pos = end;
		true
	}

	fn step(&mut self, scope: &mut dyn ParseScope) {
		let pos = self.pos;
		let lexeme = lex(self.input.as_mut(), pos);
		self.config.stats.record_lex();

		match lexeme {
			Lexeme::Open(open) => {
				let mut frame = Frame::new(pos, Some(closer_for(open)));
				frame.children.push((pos, Tree::leaf(OPEN, 1)));
				self.stack.push(frame);
				self.pos += 1;
			}
			Lexeme::Close(close) if self.stack.len() > 1 && self.stack.last().is_some_and(|f| f.closer == Some(close)) => {
				self.pos += 1;
				if let Some(mut frame) = self.stack.pop() {
					frame.children.push((pos, Tree::leaf(CLOSE, 1)));
					let start = frame.start;
					self.push(start, node(BLOCK, start, self.pos, frame.children));
				}
			}
			Lexeme::Close(_) => {
				self.push(pos, Tree::leaf(ERROR, 1));
				self.pos += 1;
			}
			Lexeme::Fence(run) => self.fence(pos, run, scope),
			Lexeme::Token(kind, len) => {
				self.push(pos, Tree::leaf(kind, len));
				self.pos += len;
			}
		}
	}

	fn fence(&mut self, pos: CharIdx, run: usize, scope: &mut dyn ParseScope) {
		let body_from = pos + run;
		let close = find_fence_close(self.input.as_mut(), body_from);
		let end = close.map_or(self.input.len(), |(at, len)| at + len);

		if self.config.lazy_fences && !overlaps(&scope.viewport(), &(pos..end)) {
			scope.skip_until_in_view(pos, end);
			self.push(pos, Tree::leaf(LAZY_FENCE, end - pos));
			self.pos = end;
			return;
		}

		let body_to = close.map_or(end, |(at, _)| at);
		let mut children = vec![(pos, Tree::leaf(FENCE_MARK, run))];
		let mut at = body_from;
		while at < body_to {
			let (kind, len) = lex(self.input.as_mut(), at).plain();
			let len = len.clamp(1, body_to - at);
			self.config.stats.record_lex();
			children.push((at, Tree::leaf(kind, len)));
			at += len;
		}
		if let Some((at, len)) = close {
			children.push((at, Tree::leaf(FENCE_MARK, len)));
		}
		self.push(pos, node(FENCE, pos, end, children));
		self.pos = end;
	}

	fn finish(&mut self) -> Tree {
		let end = self.pos;
		while self.stack.len() > 1 {
			let Some(frame) = self.stack.pop() else { break };
			let start = frame.start;
			self.push(start, node(UNCLOSED, start, end, frame.children));
		}
		match self.stack.pop() {
			Some(root) => node(DOCUMENT, root.start, end, root.children),
			None => Tree::leaf(DOCUMENT, 0),
		}
	}
}

impl PartialParse for BraceParse {
	fn advance(&mut self, scope: &mut dyn ParseScope) -> Option<Tree> {
		if let Some(tree) = &self.done {
			return Some(tree.clone());
		}

		self.config.charge_step();
		if self.pos < self.end() && !self.reuse(scope) {
			self.step(scope);
		}
		if self.pos < self.end() {
			return None;
		}

		let tree = self.finish();
		self.done = Some(tree.clone());
		Some(tree)
	}

	fn parsed_pos(&self) -> CharIdx {
		self.pos
	}

	fn stop_at(&mut self, pos: CharIdx) {
		self.stopped_at = Some(self.stopped_at.map_or(pos, |stop| stop.min(pos)));
	}

	fn stopped_at(&self) -> Option<CharIdx> {
		self.stopped_at
	}
}

/// Finds the outermost reusable node starting exactly at `pos`.
fn reusable_node(frag: &TreeFragment, pos: CharIdx, limit: CharIdx, viewport: &Range<CharIdx>) -> Option<Tree> {
	let target = frag.tree_pos(pos)?;
	let mut parent = frag.tree();
	let mut parent_start = 0;

	loop {
		let children = parent.children();
		let index = children.partition_point(|c| parent_start + c.offset + c.tree.len() <= target);
		let child = children.get(index)?;
		let start = parent_start + child.offset;
		if start > target {
			return None;
		}

		if start == target && is_reusable(&child.tree, frag, pos, limit, viewport) {
			return Some(child.tree.clone());
		}
		if child.tree.kind() != BLOCK && child.tree.kind() != UNCLOSED {
			return None;
		}
		parent = &child.tree;
		parent_start = start;
	}
}

fn is_reusable(tree: &Tree, frag: &TreeFragment, pos: CharIdx, limit: CharIdx, viewport: &Range<CharIdx>) -> bool {
	let end = pos + tree.len();
	REUSABLE.contains(&tree.kind())
		&& end <= limit
		&& frag.can_reuse(pos, end)
		&& (tree.kind() != LAZY_FENCE || !overlaps(viewport, &(pos..end)))
}
