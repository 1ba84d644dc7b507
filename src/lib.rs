//! task-events - Convert stimulus-presentation task logs into event tables
//!
//! task-events turns behavioral task logs (key/value text dumps or CSV
//! exports) into per-run event tables through a deterministic pipeline:
//! decoding → frame extraction → run segmentation (time normalization and
//! field resolution) → TSV encoding.
//!
//! ## Modules
//!
//! - **Adapters**: Parse raw text and table logs into flat frames
//! - **Segmenter**: Split frames into scanner-synchronized runs
//! - **Encoder**: Write runs as tab-separated event tables

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod naming;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod segmenter;
pub mod types;

pub use config::{ConfigSet, TaskConfig};
pub use error::ConvertError;
pub use naming::output_names;
pub use pipeline::{convert_log, Conversion, LogConverter};
pub use segmenter::{segment_runs, Segmenter};
pub use types::{EventRecord, RawFrame, Run};

/// task-events version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
