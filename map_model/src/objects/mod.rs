pub mod area;
pub mod node;
pub mod relation;
pub mod way;
