pub mod auth;
pub mod rest;
pub mod state;

pub use rest::{
    add_course_handler, clear_messages_handler, get_state_handler, mark_attendance_handler,
    today_attendance_handler,
};
