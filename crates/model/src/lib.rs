pub mod address;
pub mod id;
pub mod record;
pub mod store;
pub mod value;

pub use address::CellAddr;
pub use id::RecordId;
pub use record::{Column, Row, DEFAULT_COLUMN_WIDTH};
pub use store::CellStore;
pub use value::{CellValue, ColumnType};
