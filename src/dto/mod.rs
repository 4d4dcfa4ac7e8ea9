pub mod announcement_dto;
pub mod assignment_dto;
pub mod classroom_dto;
pub mod material_dto;
pub mod quiz_dto;
pub mod session_dto;
