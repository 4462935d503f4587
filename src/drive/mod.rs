//! Drive module.
//!
//! Folder semantics over a flat object namespace:
//! - Logical paths and tenant-scoped key composition
//! - Listing formatting (icons, sizes, sorting, breadcrumbs)
//! - Folder and file mutations (create, move, rename, delete, search)

pub mod listing;
pub mod path;
mod service;

pub use listing::{
    breadcrumbs, format_size, Breadcrumb, DirEntry, DisplayEntry, ListingFormatter, SortKey,
    SortOrder,
};
pub use path::{encode_path, remove_accents, sanitize_file_name, RelativePath, TenantRoot};
pub use service::Drive;
