pub mod plan;
pub mod quote;
pub mod report;

mod lenient;
