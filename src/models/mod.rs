pub mod application;
pub mod student;
