//! C exports.
//!
//! One process-wide [`Bridge`] sits behind a mutex that is held for the whole
//! of each call. Every export runs under `catch_unwind`, so a panic turns into
//! a failed result instead of unwinding into the host.

use crate::api::{self, Bridge};
use crate::transfer::RimeResult;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rimebridge_core::{DataPaths, SessionId};
use std::ffi::{c_char, c_int, CStr, CString};
use std::path::PathBuf;
use std::ptr;

static BRIDGE: Lazy<Mutex<Bridge>> = Lazy::new(|| Mutex::new(Bridge::new()));

/// Message of the result returned when an operation panics.
pub const INTERNAL_ERROR: &str = "Internal error";

static VERSION: Lazy<CString> = Lazy::new(|| CString::new(api::version()).unwrap_or_default());

/// Run `$body`, returning `$default` if it panics.
macro_rules! catch_panic {
    ($default:expr, $body:expr) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("caught panic at the C boundary: {}", panic_message(&e));
                $default
            }
        }
    };
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Null, empty and non-UTF-8 paths all mean "not given".
unsafe fn path_arg(raw: *const c_char, name: &str) -> Option<PathBuf> {
    if raw.is_null() {
        return None;
    }
    match CStr::from_ptr(raw).to_str() {
        Ok("") => None,
        Ok(s) => Some(PathBuf::from(s)),
        Err(_) => {
            tracing::warn!("{} is not valid UTF-8, ignoring it", name);
            None
        }
    }
}

/// Hand `value` to the host through `out`, or drop it when `out` is null.
unsafe fn write_result(out: *mut RimeResult, value: RimeResult) {
    if out.is_null() {
        drop(value);
        return;
    }
    // The host's storage is plain memory, so it must not be dropped first.
    ptr::write(out, value);
}

/// Create a session. Returns its handle, or 0 on failure.
///
/// # Safety
/// Each path must be null or point to a NUL-terminated string.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RimeInitialize(
    user_data_dir: *const c_char,
    shared_data_dir: *const c_char,
) -> c_int {
    catch_panic!(0, {
        let paths = DataPaths::new(
            path_arg(user_data_dir, "user_data_dir"),
            path_arg(shared_data_dir, "shared_data_dir"),
        );
        BRIDGE.lock().initialize(&paths).to_handle()
    })
}

/// Destroy a session. Unknown handles are ignored.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn RimeDestroy(session_id: c_int) {
    catch_panic!((), {
        BRIDGE.lock().destroy(SessionId::from_handle(session_id));
    })
}

/// Run one session operation against `bridge` with the lock held.
///
/// A panic inside the operation becomes a failed result with no state.
fn run_guarded<F>(bridge: &Mutex<Bridge>, op: F) -> RimeResult
where
    F: FnOnce(&mut Bridge) -> RimeResult,
{
    catch_panic!(RimeResult::failure(INTERNAL_ERROR), op(&mut *bridge.lock()))
}

/// # Safety
/// `result` must be null or point to writable storage for a `RimeResult`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RimeProcessKey(
    session_id: c_int,
    key_code: c_int,
    result: *mut RimeResult,
) {
    let id = SessionId::from_handle(session_id);
    write_result(result, run_guarded(&BRIDGE, |b| b.process_key(id, key_code)));
}

/// # Safety
/// `result` must be null or point to writable storage for a `RimeResult`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RimeSelectCandidate(
    session_id: c_int,
    index: c_int,
    result: *mut RimeResult,
) {
    let id = SessionId::from_handle(session_id);
    write_result(result, run_guarded(&BRIDGE, |b| b.select_candidate(id, index)));
}

/// # Safety
/// `result` must be null or point to writable storage for a `RimeResult`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RimeClearComposition(session_id: c_int, result: *mut RimeResult) {
    let id = SessionId::from_handle(session_id);
    write_result(result, run_guarded(&BRIDGE, |b| b.clear_composition(id)));
}

/// # Safety
/// `result` must be null or point to writable storage for a `RimeResult`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RimeGetCurrentState(session_id: c_int, result: *mut RimeResult) {
    let id = SessionId::from_handle(session_id);
    write_result(result, run_guarded(&BRIDGE, |b| b.current_state(id)));
}

/// Free the candidate array of a result. Calling it again is a no-op.
///
/// # Safety
/// `result` must be null or point to a `RimeResult` filled by this library.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RimeFreeResult(result: *mut RimeResult) {
    catch_panic!((), {
        if let Some(result) = result.as_mut() {
            result.release();
        }
    })
}

/// Static NUL-terminated version string; the host must not free it.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn RimeGetVersion() -> *const c_char {
    catch_panic!(ptr::null(), VERSION.as_ptr())
}

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn RimeIsAvailable() -> c_int {
    catch_panic!(0, c_int::from(api::is_available()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_panic_returns_default() {
        let value: c_int = catch_panic!(-1, {
            if c_int::MAX > 0 {
                panic!("boom");
            }
            7
        });
        assert_eq!(value, -1);
    }

    struct FailingProvider;

    impl rimebridge_core::LookupProvider for FailingProvider {
        fn lookup(&self, composition: &str) -> Vec<rimebridge_core::Candidate> {
            panic!("lookup failed for {}", composition);
        }
    }

    #[test]
    fn panicking_provider_becomes_failed_result() {
        use crate::transfer::Status;
        use std::sync::Arc;

        let bridge = Mutex::new(Bridge::new());
        let id = bridge.lock().initialize_with_provider(Arc::new(FailingProvider));

        let result = run_guarded(&bridge, |b| b.process_key(id, 'a' as c_int));
        assert_eq!(result.status(), Status::Failed);
        assert_eq!(result.error_message(), INTERNAL_ERROR);
        assert!(result.state().candidates_ptr().is_null());

        // The lock is released and the bridge keeps serving calls
        assert!(run_guarded(&bridge, |b| b.current_state(id)).is_success());
        assert!(run_guarded(&bridge, |b| b.clear_composition(id)).is_success());
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(&payload), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&payload), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(&payload), "unknown panic");
    }

    #[test]
    fn empty_path_is_not_given() {
        let empty = CString::new("").unwrap();
        let dir = CString::new("/tmp/rime").unwrap();
        unsafe {
            assert_eq!(path_arg(ptr::null(), "p"), None);
            assert_eq!(path_arg(empty.as_ptr(), "p"), None);
            assert_eq!(path_arg(dir.as_ptr(), "p"), Some(PathBuf::from("/tmp/rime")));
        }
    }
}
