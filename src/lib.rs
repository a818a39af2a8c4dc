// Library surface for the binary, headless integration tests and reuse.
// Terminal rendering and key dispatch live in the binary.
pub mod app_dirs;
pub mod backup;
pub mod clock;
pub mod config;
pub mod display;
pub mod format;
pub mod history;
pub mod log_form;
pub mod logging;
pub mod notifier;
pub mod plan;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timers;
pub mod util;
