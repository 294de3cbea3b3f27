mod catalog;
mod timeline;

pub use catalog::{CatalogError, PatchCatalog, ReleasePeriod};
pub use timeline::{TimeSelection, TimelineEntry};

pub(crate) use catalog::resolve_catalog_path;
