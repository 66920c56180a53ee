//! Client for the range query webservice.
//!
//! Expands compact range expressions into lists of node names and collapses
//! lists back into expressions, transparently splitting queries that are too
//! long for a single GET request.

pub mod client;
pub mod error;
pub mod expression;
pub mod transport;
pub mod utils;

pub use client::{Endpoint, Expansion, OutputFormat, QueryExpander, RangeConfig, RangeOutput, UserAgent};
pub use error::{RangeError, Result};
pub use expression::{partition, Expression, SplitBatch};
pub use transport::{HttpResponse, HttpTransport, Transport};
