//! Storage layer: the record store and its implementations.
//!
//! All persistence, querying and access control belong to the store; this layer only
//! issues requests and converts rows at the boundary.
//!
//! # Modules
//!
//! - `backend`: The [`RemoteStore`] trait and collection names
//! - `models`: Row types and their validation into domain records
//! - `postgrest`: The hosted store over HTTP
//! - `json`: Single-user JSON file store
//! - `memory`: In-memory store with failure injection
//! - `tables`: Server-side behavior shared by the local stores

pub mod backend;
pub mod json;
pub mod memory;
pub mod models;
pub mod postgrest;
pub mod tables;

pub use backend::{Collection, RemoteStore};
pub use json::JsonStore;
pub use memory::{MemoryStore, Request};
pub use models::{FillupChanges, FillupRow, NewFillupRow, NewVehicleRow, VehicleRow};
pub use postgrest::{PostgrestStore, Session};
pub use tables::Tables;
