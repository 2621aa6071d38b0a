/// Game data-access operations and their invariants.
pub mod games;
