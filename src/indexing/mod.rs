//! Project ingestion: file discovery and parallel parsing
//!
//! # Example
//!
//! ```ignore
//! use depsight_engine::indexing::{EntityProvider, JavaProvider};
//!
//! let output = JavaProvider::default().provide(&project_root)?;
//! println!("{} entities, {} files skipped", output.model.len(), output.skipped.len());
//! ```

mod files;
mod provider;

pub use files::{collect_files, should_skip_path};
pub use provider::{EntityProvider, JavaProvider, ProviderOutput};
