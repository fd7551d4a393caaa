//! An abstraction layer over hosted text-generation endpoints.
//!
//! This crate establishes the protocol the conversation core uses to talk
//! to a generation provider, so that the core never depends on a concrete
//! wire format. A request is an ordered list of turns, each made of text
//! and inline image parts; a response is the generated text.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod image;
mod provider;
mod request;
mod response;

pub use error::*;
pub use image::*;
pub use provider::*;
pub use request::*;
pub use response::*;
