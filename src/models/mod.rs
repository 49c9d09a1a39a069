pub mod classify_types;
pub mod descriptor;
pub mod pixel_types;
