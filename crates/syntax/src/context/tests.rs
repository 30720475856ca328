use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use weft_language::testing::BraceParser;
use weft_language::testing::kinds::{FENCE, LAZY_FENCE};
use weft_language::{ContinuationError, NodeType, ParseScope, continuation, parse_all};
use weft_primitives::{Change, Clock, ManualClock};

use super::*;

fn edit(doc: &Rope, changes: Vec<Change>) -> (ChangeSet, Rope) {
	let cs = ChangeSet::from_changes(doc.len_chars(), changes);
	let mut next = doc.clone();
	cs.apply(&mut next);
	(cs, next)
}

fn context(parser: BraceParser, text: &str, viewport: Range<CharIdx>) -> ParseContext {
	ParseContext::create(Arc::new(parser), Rope::from(text), viewport)
}

fn run(cx: &mut ParseContext, upto: Option<CharIdx>) -> bool {
	cx.work(&mut || false, upto)
}

fn has_kind(tree: &Tree, kind: NodeType) -> bool {
	let mut found = false;
	tree.walk(|_, node| found |= node.kind() == kind);
	found
}

#[test]
fn fresh_context_is_empty() {
	let cx = context(BraceParser::new(), "a b", 0..3);
	assert!(cx.tree().is_empty_tree());
	assert_eq!(cx.tree_len(), 0);
	assert!(!cx.is_done(3));
	assert!(!cx.has_pending_parse());
}

#[test]
fn work_parses_whole_document() {
	let mut cx = context(BraceParser::new(), "function f(){}\n", 0..15);
	assert!(cx.work(Duration::from_millis(100), None));
	assert_eq!(cx.tree_len(), 15);
	assert!(cx.is_done(15));
	assert!(!cx.has_pending_parse());
	assert_eq!(cx.tree().to_string(), "Document(Word Space Word Block(Open Close) Block(Open Close) Space)");
}

#[test]
fn empty_document_is_done_after_one_call() {
	let mut cx = context(BraceParser::new(), "", 0..0);
	assert!(run(&mut cx, None));
	assert!(cx.is_done(0));
	assert_eq!(cx.tree().len(), 0);
}

/// Inserting inside the parens of `function f(){}` reparses only the parens.
#[test]
fn insert_in_parens_reuses_both_sides() {
	let parser = BraceParser::new();
	let stats = parser.stats().clone();
	let mut cx = context(parser, "function f(){}\n", 0..15);
	assert!(cx.work(Duration::from_millis(100), None));

	let (changes, doc) = edit(cx.doc(), vec![Change::insert(11, "x")]);
	assert_eq!(doc.to_string(), "function f(x){}\n");
	let mut next = cx.changes(&changes, doc.clone());
	assert!(next.tree().is_empty_tree());
	assert_eq!(next.tree_len(), 0);
	let kept: Vec<_> = next.fragments().iter().map(|f| (f.range(), f.open_start(), f.open_end())).collect();
	assert_eq!(kept, vec![(0..11, false, true), (12..16, true, false)]);

	stats.reset();
	assert!(next.work(Duration::from_millis(100), None));
	assert!(next.is_done(16));
	assert_eq!(next.tree().len(), 16);
	assert!(next.tree().same_structure(&parse_all(&BraceParser::new(), &doc)));
	// `function`, ` `, `f`, `{}` and the newline; only `(x)` is lexed again.
	assert_eq!(stats.reused_nodes(), 5);
	assert_eq!(stats.reused_len(), 13);
	assert_eq!(stats.lexed_tokens(), 3);
}

/// Edits a few characters apart keep the text between them.
#[test]
fn narrow_gap_between_edits_is_reused() {
	let text = "alpha beta gamma delta\n";
	let parser = BraceParser::new();
	let stats = parser.stats().clone();
	let mut cx = context(parser, text, 0..text.len());
	assert!(run(&mut cx, None));

	let (changes, doc) = edit(cx.doc(), vec![Change::insert(0, "x "), Change::insert(22, " y")]);
	let mut next = cx.changes(&changes, doc.clone());
	let kept: Vec<_> = next.fragments().iter().map(|f| f.range()).collect();
	assert_eq!(kept, vec![2..24, 26..27]);

	stats.reset();
	assert!(run(&mut next, None));
	assert!(next.tree().same_structure(&parse_all(&BraceParser::new(), &doc)));
	// ` beta gamma `; the words touching an edit are lexed again.
	assert_eq!(stats.reused_len(), 12);
}

#[test]
fn configured_gap_drops_short_stretches() {
	let mut cx = context(BraceParser::new(), "function f(){}\n", 0..15).with_min_gap(128);
	assert!(run(&mut cx, None));

	let (changes, doc) = edit(cx.doc(), vec![Change::insert(11, "x")]);
	let next = cx.changes(&changes, doc);
	let kept: Vec<_> = next.fragments().iter().map(|f| f.range()).collect();
	assert_eq!(kept, vec![12..16]);
}

#[test]
fn edit_far_from_start_reuses_prefix() {
	let text: String = (0..30).map(|i| format!("line{i} {{ {i} }}\n")).collect();
	let parser = BraceParser::new();
	let stats = parser.stats().clone();
	let mut cx = context(parser, &text, 0..text.len());
	assert!(run(&mut cx, None));

	let at = text.len() - 3;
	let (changes, doc) = edit(cx.doc(), vec![Change::insert(at, "zz")]);
	let mut next = cx.changes(&changes, doc.clone());
	stats.reset();
	assert!(run(&mut next, None));

	assert!(next.tree().same_structure(&parse_all(&BraceParser::new(), &doc)));
	assert!(stats.reused_len() > at / 2, "reused {} chars", stats.reused_len());
	assert!(stats.lexed_tokens() < 20, "lexed {} tokens", stats.lexed_tokens());
}

#[test]
fn viewport_target_stops_near_upto() {
	let text = "abcd efgh\n".repeat(1000);
	let mut cx = context(BraceParser::new(), &text, 0..50);
	assert!(cx.work(Duration::from_millis(20), Some(50)));

	assert!(cx.is_done(50));
	assert!(!cx.is_done(10_000));
	assert_eq!(cx.tree_len(), 50);
	assert!(cx.tree().len() >= 50 && cx.tree().len() < 60, "tree len {}", cx.tree().len());
}

#[test]
fn upto_past_document_end_means_whole_document() {
	let mut cx = context(BraceParser::new(), "a b c", 0..5);
	assert!(run(&mut cx, Some(500)));
	assert!(cx.is_done(5));
	assert_eq!(cx.tree_len(), 5);
}

#[test]
fn work_resumes_after_partial_target() {
	let text = "abcd efgh\n".repeat(20);
	let mut cx = context(BraceParser::new(), &text, 0..200);
	assert!(run(&mut cx, Some(40)));
	let partial = cx.tree().clone();

	assert!(run(&mut cx, None));
	assert!(!cx.tree().ptr_eq(&partial));
	assert!(cx.is_done(200));
	assert!(cx.tree().same_structure(&parse_all(&BraceParser::new(), cx.doc())));
}

#[test]
fn done_context_returns_immediately() {
	let parser = BraceParser::new();
	let stats = parser.stats().clone();
	let mut cx = context(parser, "a (b) c", 0..7);
	assert!(run(&mut cx, None));
	let tree = cx.tree().clone();
	let steps = stats.steps();

	assert!(cx.work(Duration::ZERO, None));
	assert!(cx.work(Duration::ZERO, Some(3)));
	assert_eq!(stats.steps(), steps);
	assert!(cx.tree().ptr_eq(&tree));
}

#[test]
fn budget_predicate_is_checked_after_every_step() {
	let clock = ManualClock::new();
	let parser = BraceParser::new().with_step_cost(clock.clone(), Duration::from_millis(1));
	let stats = parser.stats().clone();
	let mut cx = context(parser, &"word ".repeat(200), 0..1000);

	let deadline = clock.now() + Duration::from_millis(10);
	let mut expired = || clock.now() > deadline;
	assert!(!cx.work(&mut expired, None));
	assert_eq!(stats.steps(), 11);
	assert_eq!(stats.parses_started(), 1);
	assert!(cx.has_pending_parse());
}

#[test]
fn slow_parser_returns_within_budget() {
	let parser = BraceParser::new().with_step_delay(Duration::from_millis(1));
	let mut cx = context(parser, &"word ".repeat(2000), 0..100);

	let start = Instant::now();
	assert!(!cx.work(Duration::from_millis(20), None));
	let elapsed = start.elapsed();
	assert!(elapsed < Duration::from_millis(120), "work ran for {elapsed:?}");
}

#[test]
fn deadline_budget_in_the_past_does_one_step() {
	let parser = BraceParser::new();
	let stats = parser.stats().clone();
	let mut cx = context(parser, &"word ".repeat(100), 0..500);
	assert!(!cx.work(Instant::now() - Duration::from_millis(1), None));
	assert_eq!(stats.steps(), 1);
}

#[test]
fn budgets_are_measured_on_the_context_clock() {
	let clock = ManualClock::new();
	let parser = BraceParser::new().with_step_cost(clock.clone(), Duration::from_millis(1));
	let stats = parser.stats().clone();
	let mut cx = context(parser, &"word ".repeat(200), 0..1000).with_clock(Arc::new(clock.clone()));

	assert!(!cx.work(Duration::from_millis(3), None));
	assert_eq!(stats.steps(), 4);

	let deadline = clock.now() + Duration::from_millis(2);
	assert!(!cx.work(deadline, None));
	assert_eq!(stats.steps(), 7);
}

#[test]
fn take_tree_commits_live_parse_without_parsing() {
	let parser = BraceParser::new();
	let stats = parser.stats().clone();
	let mut cx = context(parser, &"word ".repeat(100), 0..500);

	let mut steps = 0;
	let mut stop_after_ten = || {
		steps += 1;
		steps >= 10
	};
	assert!(!cx.work(&mut stop_after_ten, None));
	let lexed = stats.lexed_tokens();

	cx.take_tree();
	assert!(!cx.has_pending_parse());
	assert_eq!(cx.tree_len(), 25);
	assert_eq!(cx.tree().len(), 25);
	assert_eq!(stats.lexed_tokens(), lexed);
	assert!(cx.fragments()[0].open_end());
}

#[test]
fn take_tree_without_parse_is_noop() {
	let mut cx = context(BraceParser::new(), "a b", 0..3);
	assert!(run(&mut cx, None));
	let tree = cx.tree().clone();
	cx.take_tree();
	assert!(cx.tree().ptr_eq(&tree));
}

#[test]
fn identity_changes_keep_tree() {
	let mut cx = context(BraceParser::new(), "a {b} c", 0..7);
	assert!(run(&mut cx, None));
	let next = cx.changes(&ChangeSet::identity(7), cx.doc().clone());
	assert!(next.tree().ptr_eq(cx.tree()));
	assert_eq!(next.tree_len(), 7);
	assert!(next.fragments().ptr_eq(cx.fragments()));
	assert!(next.is_done(7));
}

#[test]
fn changes_map_viewport_and_skipped_ranges() {
	let mut cx = context(BraceParser::new(), &"x ".repeat(50), 20..40);
	cx.skip_until_in_view(60, 70);
	cx.skip_until_in_view(80, 90);

	let (changes, doc) = edit(cx.doc(), vec![Change::insert(10, "abc"), Change::delete(78, 92)]);
	let next = cx.changes(&changes, doc);
	assert_eq!(next.viewport(), &(23..43));
	assert_eq!(next.skipped(), &[63..73]);
}

#[test]
fn changes_move_pending_continuation() {
	let mut cx = context(BraceParser::new(), "a b", 0..3);
	cx.schedule_on = Some(continuation(async { Ok(()) }));
	let (changes, doc) = edit(cx.doc(), vec![Change::insert(0, "z")]);
	let mut next = cx.changes(&changes, doc);
	assert!(cx.take_schedule_on().is_none());
	assert!(next.take_schedule_on().is_some());
}

#[test]
fn skip_until_in_view_ignores_duplicates() {
	let mut cx = context(BraceParser::new(), &"x ".repeat(50), 0..10);
	cx.skip_until_in_view(20, 30);
	cx.skip_until_in_view(20, 30);
	cx.skip_until_in_view(40, 40);
	assert_eq!(cx.skipped(), &[20..30]);
}

#[test]
fn lazy_fence_resumes_when_scrolled_into_view() {
	let text = "x\n```\n{a\n```\ny";
	let mut cx = context(BraceParser::new(), text, 0..1);
	assert!(run(&mut cx, None));
	assert!(has_kind(cx.tree(), LAZY_FENCE));
	assert_eq!(cx.skipped(), &[2..12]);

	assert!(cx.update_viewport(0..14));
	assert!(cx.skipped().is_empty());
	assert!(!cx.is_done(14));

	assert!(run(&mut cx, None));
	assert!(has_kind(cx.tree(), FENCE));
	assert!(!has_kind(cx.tree(), LAZY_FENCE));
	assert!(cx.tree().same_structure(&parse_all(&BraceParser::new(), cx.doc())));
}

#[test]
fn viewport_change_away_from_skipped_keeps_work() {
	let text = "abcd efgh\n".repeat(100);
	let mut cx = context(BraceParser::new(), &text, 0..50);
	assert!(run(&mut cx, Some(50)));
	let tree = cx.tree().clone();

	assert!(!cx.update_viewport(0..50));
	assert!(!cx.update_viewport(500..550));
	assert_eq!(cx.viewport(), &(500..550));
	assert!(cx.tree().ptr_eq(&tree));
	assert!(cx.is_done(50));
}

#[test]
fn viewport_eviction_discards_live_parse() {
	let text = format!("{}```\nbody\n```\n", "word ".repeat(40));
	let mut cx = context(BraceParser::new(), &text, 0..10);
	assert!(run(&mut cx, None));
	assert_eq!(cx.skipped(), &[200..212]);

	let mut once = || true;
	let (changes, doc) = edit(cx.doc(), vec![Change::insert(0, "a ")]);
	let mut next = cx.changes(&changes, doc);
	assert!(!next.work(&mut once, None));
	assert!(next.has_pending_parse());

	assert!(next.update_viewport(195..215));
	assert!(!next.has_pending_parse());
	assert!(next.skipped().is_empty());
}

#[test]
fn skipping_parser_fills_placeholder() {
	let mut cx = ParseContext::create(ParseContext::skipping_parser(None), Rope::from("abc def"), 0..7);
	assert!(run(&mut cx, None));
	assert_eq!(cx.tree().kind(), NodeType::NONE);
	assert_eq!(cx.tree().len(), 7);
	assert_eq!(cx.tree_len(), 7);
	assert!(cx.fragments().is_empty(), "placeholder fragments must be cut");
	assert!(cx.take_schedule_on().is_none());
}

#[tokio::test]
async fn skipping_parser_schedules_continuation() {
	let until = continuation(async { Ok(()) });
	let mut cx = ParseContext::create(ParseContext::skipping_parser(Some(until)), Rope::from("abc"), 0..3);
	assert!(run(&mut cx, None));

	let pending = cx.take_schedule_on().expect("continuation registered");
	assert_eq!(pending.await, Ok(()));
}

#[tokio::test]
async fn scheduled_continuations_are_joined() {
	let mut cx = context(BraceParser::new(), "a", 0..1);
	{
		let mut scope = cx.scope();
		scope.schedule_on(continuation(async { Ok(()) }));
		scope.schedule_on(continuation(async { Err(ContinuationError::Failed("grammar missing".into())) }));
	}
	let merged = cx.take_schedule_on().expect("merged continuation");
	assert_eq!(merged.await, Err(ContinuationError::Failed("grammar missing".into())));
}

fn doc_and_edit() -> impl Strategy<Value = (String, usize, usize, String)> {
	"[a-c0-9 {}()\\[\\]\n;]{0,200}".prop_flat_map(|text| {
		let len = text.chars().count();
		(Just(text), 0..=len).prop_flat_map(move |(text, start)| (Just(text), Just(start), start..=len, "[a-c {}()\n]{0,8}"))
	})
}

proptest! {
	/// A context parsed partially, edited and parsed again ends with the tree a fresh parse gives.
	#[test]
	fn prop_context_matches_full_parse((text, start, end, insert) in doc_and_edit(), stop in 0usize..220) {
		let parser = BraceParser::new().lazy_fences(false);
		let len = text.chars().count();
		let mut cx = context(parser.clone(), &text, 0..len);
		run(&mut cx, Some(stop));

		let (changes, doc) = edit(cx.doc(), vec![Change::replace(start, end, insert)]);
		let mut next = cx.changes(&changes, doc.clone());
		prop_assert!(run(&mut next, None));

		let full = parse_all(&parser, &doc);
		prop_assert!(next.tree().same_structure(&full), "incremental {} != full {}", next.tree(), full);
		prop_assert!(next.is_done(doc.len_chars()));
	}
}
