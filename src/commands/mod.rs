pub mod check;
pub mod configure;
pub mod cycle;
pub mod generate;
pub mod numbers;
