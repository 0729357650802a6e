//! A barebones client for the record inventory service.
#![deny(missing_docs)]

mod client;
pub use client::*;

mod collection;
pub use collection::*;

mod bins;
pub use bins::*;

mod routes;
pub use routes::*;

mod request;
