pub mod aligner;
pub(crate) mod executor;
