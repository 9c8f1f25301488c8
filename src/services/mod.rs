pub mod catalog;
pub mod friendship;
pub mod popularity;

pub use catalog::CatalogService;
pub use friendship::FriendshipService;
pub use popularity::PopularityService;
