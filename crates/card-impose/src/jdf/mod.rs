//! CIP4 JDF cutting job encoding
//!
//! [`encode`] turns a placement plan and its cut geometry into a
//! [`CuttingJobDocument`], [`to_xml`] writes it and [`parse_jdf`] reads it
//! back so a job can be checked before it is sent to a cutter.

mod document;
mod profile;
mod reader;
mod writer;

pub use document::*;
pub use profile::*;
pub use reader::*;
pub use writer::{JDF_NAMESPACE, to_xml};
