use std::ops::Range;

/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for documents, trees and fragments.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// Returns true if two half-open ranges share at least one position.
///
/// Empty ranges never overlap anything.
pub fn overlaps(a: &Range<CharIdx>, b: &Range<CharIdx>) -> bool {
	a.start < b.end && b.start < a.end
}
