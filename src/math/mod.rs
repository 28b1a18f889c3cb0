pub mod full_math;
pub mod geometric_mean;
