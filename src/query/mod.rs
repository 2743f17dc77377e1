pub mod columns;
pub mod filter;
mod order;
mod page;
mod process;
mod request;

pub use columns::{ColMap, ColSpec, ColType, TableSpec};
pub use filter::FilterField;
pub use page::Page;
pub use process::{fetch_page, try_fetch_page, Record};
pub use request::{ListRequest, Operator};
