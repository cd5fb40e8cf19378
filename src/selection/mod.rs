pub mod selector;

pub use selector::{select, select_with_rng, Candidate, RoundingMode, Selection, SelectionPolicy, TieBreak};
