#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Upgrade orchestration for upnotify
//!
//! A session classifies the pending changes, waits for the user, runs the
//! privileged operations one at a time and folds their event streams into a
//! [`SessionView`] that a [`Reporter`] renders.
//!
//! [`SessionMachine`] holds all state and is driven purely by [`Input`]s, so
//! it can be tested without processes or rendering. [`Session`] wires it to
//! real runners.

mod driver;
mod machine;
mod stage;
mod view;

pub use driver::{Reporter, Session, SessionOutcome, UserCommand};
pub use machine::{
    Effect, Input, SessionMachine, SessionParams, REBOOT_REQUIRED_TEXT, RELEASE_FALLBACK_TEXT,
    UPGRADES_AVAILABLE_TEXT, UP_TO_DATE_TEXT,
};
pub use stage::Stage;
pub use view::{ErrorEntry, SessionView, Transcript};
