//! Order admission for the paygate billing gateway
//!
//! [`OrderValidator`] decides whether a project's order request may become
//! an order; [`OrderProcessor`] runs it and stores the admitted order.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paygate_orders::{OrderProcessor, OrderRequest};
//!
//! let processor = OrderProcessor::new(repository, geo, clock).with_settings(&settings);
//! let request = OrderRequest::from_params(&form, remote_ip)?;
//! let order = processor.process(&request).await?;
//! ```

pub mod error;
pub mod processor;
pub mod request;
pub mod signature;
pub mod validator;

pub use error::{AdmissionError, AdmissionResult};
pub use processor::OrderProcessor;
pub use request::{OrderRequest, field};
pub use signature::{request_signature, verify_request};
pub use validator::{Admission, OrderValidator};
