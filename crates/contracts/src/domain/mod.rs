pub mod a001_product_specification;
pub mod common;
