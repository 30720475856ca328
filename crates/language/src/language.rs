use std::fmt;
use std::sync::Arc;

use crate::parser::Parser;

/// A named parser.
///
/// Two documents using the same `Arc<Language>` share one parser instance;
/// language identity is pointer identity.
pub struct Language {
	name: String,
	parser: Arc<dyn Parser>,
}

impl Language {
	pub fn new(name: impl Into<String>, parser: Arc<dyn Parser>) -> Arc<Self> {
		Arc::new(Self { name: name.into(), parser })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn parser(&self) -> &Arc<dyn Parser> {
		&self.parser
	}
}

impl fmt::Debug for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Language").field("name", &self.name).finish_non_exhaustive()
	}
}
