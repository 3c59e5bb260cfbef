pub mod deserialise;
pub mod rdata;
pub mod serialise;
pub mod types;
