mod api;
mod article;
mod category;
mod commons;

pub use article::{fetch_extract, fetch_wikitext};
pub use category::{CategoryListing, list_category_members};
pub use commons::{ResolvedAsset, resolve_asset, resolve_file_url};
