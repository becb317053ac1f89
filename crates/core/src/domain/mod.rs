pub mod advisory;
pub mod eco;
pub mod factors;
pub mod fare;
pub mod prediction;
pub mod trip;
