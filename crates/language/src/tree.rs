//! Immutable syntax trees.
//!
//! A [`Tree`] is a cheap handle to shared node data. Trees never change once
//! built, so handing one to a reader is a reference count bump. The canonical
//! empty tree is a single shared instance and can be recognised by identity.

use std::fmt;
use std::sync::{Arc, LazyLock};

use weft_primitives::{CharIdx, CharLen};

/// Identifies the kind of a node.
///
/// Node types are compared by id; the name is for display only.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeType {
	id: u16,
	name: &'static str,
}

impl NodeType {
	/// The anonymous kind used for placeholders and the empty tree.
	pub const NONE: NodeType = NodeType { id: 0, name: "None" };

	/// Declares a node type. Id 0 is reserved for [`NodeType::NONE`].
	pub const fn new(id: u16, name: &'static str) -> Self {
		Self { id, name }
	}

	pub const fn id(self) -> u16 {
		self.id
	}

	pub const fn name(self) -> &'static str {
		self.name
	}

	pub const fn is_none(self) -> bool {
		self.id == 0
	}
}

impl fmt::Debug for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.name, self.id)
	}
}

/// A child node positioned relative to the start of its parent.
#[derive(Debug, Clone)]
pub struct Child {
	pub offset: CharIdx,
	pub tree: Tree,
}

struct TreeData {
	kind: NodeType,
	len: CharLen,
	children: Box<[Child]>,
}

static EMPTY: LazyLock<Tree> = LazyLock::new(|| Tree::leaf(NodeType::NONE, 0));

/// An immutable, shareable syntax tree node.
#[derive(Clone)]
pub struct Tree(Arc<TreeData>);

impl Tree {
	/// Builds a node from its children.
	///
	/// Children must be ordered, non-overlapping and lie within `len`.
	pub fn new(kind: NodeType, len: CharLen, children: Vec<Child>) -> Self {
		debug_assert!(
			children.windows(2).all(|w| w[0].offset + w[0].tree.len() <= w[1].offset),
			"children of {} overlap or are out of order",
			kind.name()
		);
		debug_assert!(
			children.last().is_none_or(|c| c.offset + c.tree.len() <= len),
			"children of {} extend past its length",
			kind.name()
		);
		Self(Arc::new(TreeData {
			kind,
			len,
			children: children.into_boxed_slice(),
		}))
	}

	/// Builds a node without children.
	pub fn leaf(kind: NodeType, len: CharLen) -> Self {
		Self::new(kind, len, Vec::new())
	}

	/// Returns the shared empty tree.
	pub fn empty() -> Self {
		EMPTY.clone()
	}

	/// Returns true if this is the shared empty tree.
	///
	/// A zero-length tree produced by a parser is not the empty tree.
	pub fn is_empty_tree(&self) -> bool {
		self.ptr_eq(&EMPTY)
	}

	pub fn kind(&self) -> NodeType {
		self.0.kind
	}

	/// Number of characters covered by this node.
	pub fn len(&self) -> CharLen {
		self.0.len
	}

	pub fn is_empty(&self) -> bool {
		self.0.len == 0
	}

	pub fn children(&self) -> &[Child] {
		&self.0.children
	}

	/// Returns true if both handles point at the same node data.
	pub fn ptr_eq(&self, other: &Tree) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Structural equality: same kinds, lengths and child layout all the way down.
	pub fn same_structure(&self, other: &Tree) -> bool {
		if self.ptr_eq(other) {
			return true;
		}
		self.kind() == other.kind()
			&& self.len() == other.len()
			&& self.children().len() == other.children().len()
			&& self
				.children()
				.iter()
				.zip(other.children())
				.all(|(a, b)| a.offset == b.offset && a.tree.same_structure(&b.tree))
	}

	/// Total number of nodes, this one included.
	pub fn node_count(&self) -> usize {
		1 + self.children().iter().map(|c| c.tree.node_count()).sum::<usize>()
	}

	/// Visits every node in document order with its absolute start position.
	pub fn walk(&self, mut visit: impl FnMut(CharIdx, &Tree)) {
		fn go(tree: &Tree, start: CharIdx, visit: &mut dyn FnMut(CharIdx, &Tree)) {
			visit(start, tree);
			for child in tree.children() {
				go(&child.tree, start + child.offset, visit);
			}
		}
		go(self, 0, &mut visit);
	}
}

impl fmt::Debug for Tree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tree")
			.field("kind", &self.kind())
			.field("len", &self.len())
			.field("children", &self.children().len())
			.finish()
	}
}

/// S-expression rendering, e.g. `Document(Word Space Block(Open Close))`.
impl fmt::Display for Tree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.kind().name())?;
		if self.children().is_empty() {
			return Ok(());
		}
		f.write_str("(")?;
		for (i, child) in self.children().iter().enumerate() {
			if i > 0 {
				f.write_str(" ")?;
			}
			write!(f, "{}", child.tree)?;
		}
		f.write_str(")")
	}
}
