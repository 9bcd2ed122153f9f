pub mod ensure;
pub mod status;
