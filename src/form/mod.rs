//! Build submission form: option catalogue, per-slot state, and the
//! in-memory drafts that survive between form interactions.

pub mod catalogue;
pub mod drafts;
pub mod state;
