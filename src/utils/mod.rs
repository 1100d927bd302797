pub mod crypto;
pub mod responses;
