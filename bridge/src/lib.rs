//! rimebridge
//!
//! Input-method composition sessions exported through a C ABI, for hosts such
//! as game engines that cannot link Rust directly. The composition logic lives
//! in `rimebridge-core`; this crate adds the fixed-layout result structures,
//! the session-owning [`Bridge`], and the `Rime*` exports declared in
//! `include/rimebridge.h`.
//!
//! Host contract in short:
//! - `RimeInitialize` returns a handle (0 on failure).
//! - Every session call fills a caller-provided `RimeResult`.
//! - Each filled result is handed back once through `RimeFreeResult`.

pub mod api;
pub mod ffi;
pub mod transfer;

pub use api::{is_available, version, Bridge, VERSION};
pub use ffi::{
    RimeClearComposition, RimeDestroy, RimeFreeResult, RimeGetCurrentState, RimeGetVersion,
    RimeInitialize, RimeIsAvailable, RimeProcessKey, RimeSelectCandidate,
};
pub use transfer::{
    DecodedResult, RimeCandidate, RimeInputState, RimeResult, Status, RIME_STATUS_FAILED,
    RIME_STATUS_NOT_HANDLED, RIME_STATUS_OK,
};

// Re-exported so hosts embedding from Rust need a single dependency.
pub use rimebridge_core::{Config, DataPaths, LookupProvider, SessionId};
