//! Cloud Firestore backend.
//!
//! Talks to the Firestore REST v1 API:
//!
//! | Operation | Endpoint |
//! |---|---|
//! | list, list_where | `POST documents:runQuery` |
//! | get | `GET documents/{collection}/{id}` |
//! | update, upsert_merge | `POST documents:commit` |
//! | delete | `DELETE documents/{collection}/{id}` |
//!
//! Setting `FIRESTORE_EMULATOR_HOST` points the client at a local emulator.

pub mod client;
pub mod codec;
pub mod query;

pub use client::FirestoreStore;
