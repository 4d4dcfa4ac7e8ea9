pub mod analytics;
pub mod announcement;
pub mod assignment;
pub mod classroom;
pub mod health;
pub mod material;
pub mod quiz;
pub mod session;
