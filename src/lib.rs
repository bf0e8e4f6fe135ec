#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

#[macro_use]
mod macros;

pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod kind;
pub mod list;
pub mod meta;
pub mod render;
pub mod stacktrace;
pub mod structured;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use codec::{decode, decode_or_warning, decode_str, encode, encode_to_string};
pub use config::{Config, IdProvider, UuidProvider};
pub use convert::{ResultExt, as_structured, contains, map, map_opt, wrap, wrap_boxed};
pub use error::DecodeError;
pub use kind::Kind;
pub use list::ErrorList;
pub use meta::{Meta, Pair};
pub use render::RenderMode;
pub use stacktrace::Stacktrace;
pub use structured::{Chain, StructuredError};
