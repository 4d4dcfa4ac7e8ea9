pub mod announcement;
pub mod assignment;
pub mod attempt;
pub mod classroom;
pub mod material;
pub mod quiz;
