//! Host services the editing session depends on.
//!
//! ARCHITECTURE
//! ============
//! The canvas engine never touches storage or decodes on its own. These
//! modules own those concerns so the session only forwards engine actions.

pub mod images;
pub mod persistence;
