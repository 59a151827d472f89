pub mod client;
pub mod colors;
pub mod finder;
pub mod models;
pub mod parser;

pub use client::{CompetitionApi, WomClient};
pub use finder::CompetitionFinder;
pub use models::*;
