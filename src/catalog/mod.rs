pub mod creative;
pub mod loader;
pub mod mp4;
pub mod store;

pub use creative::{Catalog, CatalogBuilder, Creative, CreativeId};
pub use loader::load_dir;
pub use store::CatalogStore;
