// Library exports for plotdeck

pub mod data;
pub mod demo;
pub mod error;
pub mod host;
pub mod json_path;
pub mod options;
pub mod plugin;
pub mod render;
pub mod scheme;
pub mod sheet;
pub mod upload;
pub mod xlsx;

pub use data::{ChartData, ChartKind, DataValue, Dataset};
pub use error::IngestError;
pub use host::ChartHost;
pub use options::ChartOptions;
pub use scheme::ColorScheme;
