// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. config::ConfigKey)
    clippy::module_name_repetitions
)]

//! # Scratch Title
//!
//! Content-derived tab titles for unsaved ("temporary") editor buffers.
//!
//! A buffer with no file behind it is usually labelled `untitled`. With the
//! feature active, its tab shows the buffer's first row instead:
//! - Trimmed, and cut to a maximum length with a trailing `…`
//! - Optionally taken from the first non-blank row
//! - Falling back to a configurable default label
//! - Reverting to the host's own title once the buffer is saved
//!
//! ## Architecture
//!
//! The host editor is abstracted behind the traits in [`host`]. On top of it:
//! - **Title**: pure computation from buffer lines and settings
//! - **Tracker**: per-editor cache that notifies only on real title changes
//! - **Intercept**: reversible override of each item's title accessors
//! - **Controller**: activation, deactivation and config reactions
//!
//! ## Modules
//!
//! - [`title`]: Title computation
//! - [`tracker`]: Per-editor state and change suppression
//! - [`intercept`]: Title accessor interception
//! - [`controller`]: Feature lifecycle
//! - [`config`]: Settings, config store and settings files
//! - [`host`]: Host editor contracts
//! - [`event`]: Emitters and subscriptions
//! - [`editor`]: In-memory text editor
//! - [`workspace`]: In-memory workspace
//! - [`watcher`]: File watching for the preview CLI

pub mod config;
pub mod controller;
pub mod editor;
pub mod event;
pub mod host;
pub mod intercept;
pub mod title;
pub mod tracker;
pub mod watcher;
pub mod workspace;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigKey, ConfigValue, MemoryConfigStore, TitleConfig};
    pub use crate::controller::FeatureController;
    pub use crate::editor::Editor;
    pub use crate::host::{ConfigStore, PaneItem, TextEditor, Workspace};
    pub use crate::title::compute_title;
    pub use crate::workspace::MemoryWorkspace;
}
