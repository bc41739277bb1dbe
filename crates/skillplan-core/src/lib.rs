pub mod achievements;
pub mod advance;
pub mod assessment;
pub mod assign;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod generate;
pub mod io;
pub mod paths;
pub mod plan;
pub mod profile;
pub mod recommend;
pub mod store;
pub mod sync;
pub mod types;

pub use error::{PlanError, Result};
