//! Command handlers organized by capability.
//!
//! | Module | Commands | Capability |
//! |--------|----------|------------|
//! | `read` | 9 | Reader |
//! | `write` | 2 | Writer |

pub mod read;
pub mod write;
