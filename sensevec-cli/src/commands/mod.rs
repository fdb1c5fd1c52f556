//! Command implementations

pub mod info;
pub mod key;
pub mod query;

pub use info::InfoArgs;
pub use key::KeyArgs;
pub use query::QueryArgs;
