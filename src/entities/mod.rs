pub mod prelude;

pub mod brands;
pub mod collection_polishes;
pub mod custom_collections;
pub mod polish_usage;
pub mod polishes;
pub mod users;
