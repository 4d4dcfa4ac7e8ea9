pub mod grading;
pub mod session;
