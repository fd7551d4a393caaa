//! An out-of-the-box conversation assistant about African cultures, wired
//! to the Gemini provider.
//!
//! The crate includes a CLI tool for using in the terminal. It can also be
//! used as a library to bring the assistant into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod attachment;
mod prefs;
mod quick_action;
mod session;

pub use attachment::{LoadImageError, load_image, mime_for_path};
pub use prefs::FileStore;
pub use quick_action::{QUICK_ACTIONS, QuickAction};
pub use session::{Session, SessionBuilder};

/// Re-exports of [`palaver_core`] crate.
pub mod core {
    pub use palaver_core::*;
}
