//! Easel Core Types and Geometry
//!
//! This crate provides the foundational types for the Easel diagram canvas.
//! It includes:
//!
//! - **Identifiers**: String-interned identifiers ([`identifier::Id`]) and typed wrappers
//! - **Geometry**: Points, sizes and bounds ([`geometry`] module)
//! - **Viewport**: The screen ↔ canvas transform ([`viewport::Viewport`])
//! - **Kinds**: Diagram variants and shape kinds ([`kind`] module)
//! - **Connection points**: Per-kind point layouts and resolution ([`connection`] module)
//! - **Routing**: Connector path routing ([`routing::route`])

pub mod connection;
pub mod geometry;
pub mod identifier;
pub mod kind;
pub mod routing;
pub mod viewport;
