pub mod filter;
pub mod query;
pub mod registry;
pub mod text;
