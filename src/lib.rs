//! Rendering and delivery core of an auction assistant chat client.
//!
//! Assistant replies are revealed progressively by [`delivery`], committed
//! once into the [`store`], then classified by [`markup`] and turned into
//! HTML by [`render`] (formulas go through [`math`]).

pub mod config;
pub mod delivery;
pub mod errors;
pub mod markup;
pub mod math;
pub mod models;
pub mod render;
pub mod service;
pub mod store;
pub mod transport;
