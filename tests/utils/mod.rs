pub mod builders;
pub mod mocks;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use builders::{now, CompetitionBuilder};
#[allow(unused_imports)]
pub use mocks::MockCompetitionApi;
