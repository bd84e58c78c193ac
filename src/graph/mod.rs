pub mod builder;
pub mod topo;
pub mod validate;
