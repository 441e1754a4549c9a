mod backend_table;
pub use backend_table::{BackendTable, BackendTableState};
