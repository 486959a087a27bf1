// bridge/tests/scenarios.rs
//
// Host-visible behaviour of the Bridge, read back through the fixed-layout
// results exactly as a host would see them.
//
// Tests cover:
// - Typing, selecting and out-of-range selection
// - Erase on an empty session and invalid handles
// - Long compositions and candidate strings truncated to the array size
// - Result release and handle lifecycle
// - A caller-supplied provider

use rimebridge::{Bridge, DataPaths, RimeResult, SessionId, Status};
use rimebridge_core::{Candidate, LookupProvider, KEY_BACKSPACE, KEY_RETURN};
use std::sync::Arc;

fn session() -> (Bridge, SessionId) {
    let mut bridge = Bridge::new();
    let id = bridge.initialize(&DataPaths::default());
    assert!(id.is_valid());
    (bridge, id)
}

fn type_keys(bridge: &mut Bridge, id: SessionId, keys: &str) -> RimeResult {
    let mut last = RimeResult::zeroed();
    for ch in keys.chars() {
        last = bridge.process_key(id, ch as i32);
        assert_eq!(last.status(), Status::Ok, "key {:?}", ch);
    }
    last
}

fn texts(result: &RimeResult) -> Vec<String> {
    result.state().candidates().iter().map(|c| c.text()).collect()
}

#[test]
fn typing_ni_lists_three_candidates() {
    let (mut bridge, id) = session();
    let result = type_keys(&mut bridge, id, "ni");

    assert_eq!(result.state().composition(), "ni");
    assert_eq!(result.state().candidate_count(), 3);
    assert_eq!(texts(&result), vec!["你", "尼", "泥"]);

    let indices: Vec<i32> = result.state().candidates().iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(result.state().candidates()[0].comment(), "拼音: ni");

    let page = result.state().page_info();
    assert_eq!(page.page_size, 5);
    assert_eq!(page.page_no, 0);
    assert!(page.is_last_page);
}

#[test]
fn selecting_first_candidate_commits_and_resets() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "ni");

    let result = bridge.select_candidate(id, 0);
    assert!(result.is_success());
    assert_eq!(result.selected_text(), "你");
    assert_eq!(result.state().composition(), "");
    assert_eq!(result.state().candidate_count(), 0);
    assert!(result.state().candidates_ptr().is_null());
}

#[test]
fn out_of_range_selection_keeps_state() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "ni");

    let result = bridge.select_candidate(id, 5);
    assert_eq!(result.status(), Status::Failed);
    assert_eq!(result.error_message(), "Candidate index out of range");
    assert_eq!(result.state().composition(), "ni");
    assert_eq!(texts(&result), vec!["你", "尼", "泥"]);
    assert!(result.selected_text().is_empty());
}

#[test]
fn erase_on_empty_session_succeeds() {
    let (mut bridge, id) = session();
    let result = bridge.process_key(id, KEY_BACKSPACE);
    assert!(result.is_success());
    assert_eq!(result.state().composition(), "");
    assert_eq!(result.state().candidate_count(), 0);
}

#[test]
fn erase_recomputes_candidates() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "nihaox");
    let result = bridge.process_key(id, KEY_BACKSPACE);
    assert_eq!(result.state().composition(), "nihao");
    assert_eq!(texts(&result), vec!["你好"]);
}

#[test]
fn invalid_handle_reports_error_and_empty_state() {
    let mut bridge = Bridge::new();
    let bogus = SessionId::from_raw(999);

    for result in [
        bridge.process_key(bogus, 'a' as i32),
        bridge.select_candidate(bogus, 0),
        bridge.clear_composition(bogus),
        bridge.current_state(bogus),
    ] {
        assert_eq!(result.status(), Status::Failed);
        assert_eq!(result.error_message(), "Invalid session ID");
        assert_eq!(result.state().composition(), "");
        assert_eq!(result.state().candidate_count(), 0);
        assert!(result.state().candidates_ptr().is_null());
    }
}

#[test]
fn long_composition_is_truncated() {
    let (mut bridge, id) = session();
    let keys: String = std::iter::repeat('a').take(600).collect();
    type_keys(&mut bridge, id, &keys);

    let result = bridge.current_state(id);
    let composition = result.state().composition();
    assert_eq!(composition.len(), 511);
    assert!(composition.bytes().all(|b| b == b'a'));
}

#[test]
fn enter_does_not_pick_a_candidate() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "wo");
    let result = bridge.process_key(id, KEY_RETURN);
    assert!(result.is_success());
    assert!(result.selected_text().is_empty());
    assert_eq!(result.state().composition(), "wo");
    assert_eq!(texts(&result), vec!["我", "握", "卧"]);
}

#[test]
fn non_alphabet_key_is_not_handled() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "wo");
    for code in ['A' as i32, '1' as i32, 0xffe1] {
        let result = bridge.process_key(id, code);
        assert_eq!(result.status(), Status::NotHandled);
        assert_eq!(result.state().composition(), "wo");
    }
}

#[test]
fn clear_twice_is_same_as_once() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "hao");
    let once = bridge.clear_composition(id).decode();
    let twice = bridge.clear_composition(id).decode();
    assert_eq!(once, twice);
    assert_eq!(twice.snapshot.composition, "");
    assert!(twice.snapshot.candidates.is_empty());
}

#[test]
fn release_is_idempotent() {
    let (mut bridge, id) = session();
    let mut result = type_keys(&mut bridge, id, "shi");
    assert_eq!(result.state().candidate_count(), 3);

    result.release();
    assert!(result.state().candidates_ptr().is_null());
    assert_eq!(result.state().candidate_count(), 0);
    result.release();
    assert_eq!(result.state().candidate_count(), 0);
    // Strings and page info survive the release
    assert_eq!(result.state().composition(), "shi");
}

#[test]
fn decode_matches_session_state() {
    let (mut bridge, id) = session();
    type_keys(&mut bridge, id, "shijie");
    let decoded = bridge.current_state(id).decode();

    let state = bridge.registry().get(id).unwrap();
    assert_eq!(decoded.snapshot, state.snapshot());
    assert_eq!(decoded.status, Status::Ok);
}

#[test]
fn handles_are_never_reused() {
    let mut bridge = Bridge::new();
    let first = bridge.initialize(&DataPaths::default());
    bridge.destroy(first);
    bridge.destroy(first);
    let second = bridge.initialize(&DataPaths::default());

    assert_ne!(first, second);
    assert!(second.get() > first.get());
    assert_eq!(bridge.current_state(first).error_message(), "Invalid session ID");
    assert!(bridge.current_state(second).is_success());
    assert_eq!(bridge.session_count(), 1);
}

#[test]
fn sessions_do_not_share_compositions() {
    let mut bridge = Bridge::new();
    let a = bridge.initialize(&DataPaths::default());
    let b = bridge.initialize(&DataPaths::default());

    type_keys(&mut bridge, a, "ni");
    type_keys(&mut bridge, b, "wo");
    bridge.clear_composition(a);

    assert_eq!(bridge.current_state(a).state().composition(), "");
    assert_eq!(bridge.current_state(b).state().composition(), "wo");
}

struct Upper;

impl LookupProvider for Upper {
    fn lookup(&self, composition: &str) -> Vec<Candidate> {
        vec![Candidate::new(composition.to_uppercase(), "upper")]
    }
}

#[test]
fn caller_supplied_provider_drives_candidates() {
    let mut bridge = Bridge::new();
    let id = bridge.initialize_with_provider(Arc::new(Upper));
    let result = type_keys(&mut bridge, id, "abc");
    assert_eq!(texts(&result), vec!["ABC"]);
    assert_eq!(result.state().candidates()[0].comment(), "upper");

    let selected = bridge.select_candidate(id, 0);
    assert_eq!(selected.selected_text(), "ABC");
}

struct Oversized;

impl LookupProvider for Oversized {
    fn lookup(&self, _composition: &str) -> Vec<Candidate> {
        vec![Candidate::new("你".repeat(300), "a".repeat(400))]
    }
}

#[test]
fn candidate_strings_are_capped_at_array_size() {
    let mut bridge = Bridge::new();
    let id = bridge.initialize_with_provider(Arc::new(Oversized));
    let result = type_keys(&mut bridge, id, "ni");

    let candidate = &result.state().candidates()[0];
    let text = candidate.text();
    // 85 three-byte characters fit in 255 bytes exactly
    assert_eq!(text.len(), 255);
    assert_eq!(text, "你".repeat(85));
    assert_eq!(candidate.comment().len(), 255);
    assert_eq!(candidate.text[255], 0);
    assert_eq!(candidate.comment[255], 0);

    let selected = bridge.select_candidate(id, 0);
    assert_eq!(selected.status(), Status::Ok);
    assert_eq!(selected.selected_text().len(), 255);
    assert_eq!(selected.selected_text(), "你".repeat(85));
}

struct Unaligned;

impl LookupProvider for Unaligned {
    fn lookup(&self, _composition: &str) -> Vec<Candidate> {
        // One ASCII byte shifts every character so 255 bytes ends mid-character
        vec![Candidate::plain(format!("x{}", "你".repeat(100)))]
    }
}

#[test]
fn capped_text_never_splits_a_character() {
    let mut bridge = Bridge::new();
    let id = bridge.initialize_with_provider(Arc::new(Unaligned));
    let result = type_keys(&mut bridge, id, "ni");

    let text = result.state().candidates()[0].text();
    assert_eq!(text.len(), 253);
    assert_eq!(text, format!("x{}", "你".repeat(84)));
}
