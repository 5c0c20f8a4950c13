//! pdbcurate-curation: grouping, filtering, sorting and export of curated
//! records.
//!
//! Everything here is pure and synchronous: the web layer hands in a record
//! snapshot plus a `ViewState` and gets back the ordered groups to render or
//! the CSV text to download.

pub mod dates;
pub mod export;
pub mod filter;
pub mod grouping;
pub mod view;

pub use dates::parse_release_date;
pub use export::{export_csv, export_records};
pub use filter::{visible_groups, GroupQuery, SortDirection};
pub use grouping::{group_records, Group, Grouping};
pub use view::{ViewAction, ViewState};
