pub mod occurrences;
pub mod transitions;
pub mod zone;
