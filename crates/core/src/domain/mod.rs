pub mod analysis;
pub mod product;
pub mod sales;
