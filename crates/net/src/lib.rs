#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for upnotify
//!
//! This crate fetches the distribution's release catalog so a pending
//! release upgrade can be named. Every lookup is best effort.

mod client;
mod meta_release;

pub use client::{NetClient, NetConfig};
pub use meta_release::{
    parse_meta_release, MetaReleaseClient, ReleaseInfo, FALLBACK_RELEASE_TEXT,
};
