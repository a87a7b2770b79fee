pub mod regra_negocio;

pub use regra_negocio::*;
