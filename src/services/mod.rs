pub mod analytics_service;
pub mod announcement_service;
pub mod assignment_service;
pub mod classroom_service;
pub mod material_service;
pub mod progress_service;
pub mod quiz_service;
pub mod session_service;
