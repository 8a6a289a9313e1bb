//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the query shape the store exposes (insert/update/delete/range).
//! - Isolate SQLite details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidRange`) in
//!   addition to transport errors (`StoreUnavailable`).

pub mod stone_repo;
