//! The DNS wire format: types, serialisation, and deserialisation.
//!
//! The main types are `Message`, for whole messages; `ResourceRecord`
//! and its `RecordData`, for single records; and `DomainName`.  See
//! RFC 1035 (and about forty of its successors) for the details.

pub mod bitmap;
pub mod deserialise;
pub mod options;
pub mod rdata;
pub mod serialise;
pub mod types;
