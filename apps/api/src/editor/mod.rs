//! Client-side editing engine for one resume document.
//!
//! Nothing here owns a thread or a lock. A caller (UI event loop, test)
//! drives the engine by calling into [`session::EditorSession`] and
//! supplying the current time for debounce decisions.

pub mod autosave;
pub mod dialog;
pub mod history;
pub mod ports;
pub mod session;
pub mod shortcuts;
pub mod state;
pub mod validation;
