//! Metadata managers for metahub.
//!
//! [`Catalog`] is the only place that mutates shared metadata. Each
//! operation commits to the resource store with a compare-and-swap write,
//! refreshes this node's cache, and then announces the change to peers. The
//! announcements an operation makes are fixed in its body:
//!
//! | operation            | announces                                   |
//! |----------------------|---------------------------------------------|
//! | `create_cube`        | `cube/CREATE`, `project/UPDATE`             |
//! | `update_cube`        | `cube/UPDATE`                               |
//! | `drop_cube`          | `cube/DROP`, `project/UPDATE` per project   |
//! | `create_cube_desc`   | `cube_desc/CREATE`                          |
//! | `update_cube_desc`   | `cube_desc/UPDATE`                          |
//! | `remove_cube_desc`   | `cube_desc/DROP`                            |
//! | `create_project`     | `project/CREATE`                            |
//! | `drop_project`       | `project/DROP`                              |
//! | `save_source_table`  | `table/CREATE` or `table/UPDATE`            |
//! | `create_data_model`  | `data_model/CREATE`                         |
//! | `update_data_model`  | `data_model/UPDATE`                         |
//!
//! A write that fails, including a version conflict, announces nothing.

pub mod catalog;
pub mod error;

pub use catalog::{Catalog, INDEX_UPDATE_ATTEMPTS};
pub use error::{CatalogError, CatalogResult};
