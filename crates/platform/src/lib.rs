#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform abstraction layer for Debian-family Linux systems.
//!
//! This crate provides a unified interface for the host facts and process
//! plumbing the notifier depends on:
//! - Process execution through an async trait so callers can be tested with fakes
//! - Administrative-rights checks for the privileged helper
//! - Distribution codename lookup from os-release
//! - The reboot-required marker probe

pub mod os_release;
pub mod privilege;
pub mod process;
pub mod reboot;

pub use os_release::{parse_codename, read_codename};
pub use privilege::{is_privileged, require_root};
pub use process::{CommandOutput, LinuxProcessOperations, PlatformCommand, ProcessOperations};
pub use reboot::{MarkerFileProbe, RebootProbe};
