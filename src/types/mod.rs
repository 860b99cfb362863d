pub(crate) mod af;
pub mod match_options;
pub(crate) mod prefix_id;

pub use af::AddressFamily;
pub(crate) use prefix_id::PrefixId;

pub mod errors;
pub mod stats;
pub mod test_types;

#[cfg(test)]
pub(crate) mod tests;
