//! Package location and metadata
//!
//! This module turns a package name into a [`ResolvedPackage`]: finding its
//! directory, parsing its descriptor, deriving its export map and listing
//! the files a bundle may need.

mod descriptor;
mod exports;
mod inventory;
mod loader;
mod locator;
mod model;

pub use descriptor::{DEFAULT_MAIN, Descriptor};
pub use exports::{derive_exports, export_symbol};
pub use inventory::{FileFilter, enumerate_files};
pub use loader::PackageMetadataLoader;
pub use locator::{Location, LocatorCache, PackageLocator};
pub use model::{PackageFile, PackageStatus, ResolvedPackage};
