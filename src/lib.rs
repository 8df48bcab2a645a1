pub mod angle_math;
pub mod aspect_errors;
pub mod aspects;
pub mod bodies;
pub mod constants;
pub mod dedup;
pub mod event;
pub mod position;
pub mod scanner;
pub mod solver;
pub mod time;
