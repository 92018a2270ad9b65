pub mod binomial;
pub mod recovery;
pub mod stats;
