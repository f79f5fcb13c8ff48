pub mod analytics;
pub mod brand;
pub mod collection;
pub mod polish;
pub mod user;
