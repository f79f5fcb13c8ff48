pub use super::brands::Entity as Brands;
pub use super::collection_polishes::Entity as CollectionPolishes;
pub use super::custom_collections::Entity as CustomCollections;
pub use super::polish_usage::Entity as PolishUsage;
pub use super::polishes::Entity as Polishes;
pub use super::users::Entity as Users;
