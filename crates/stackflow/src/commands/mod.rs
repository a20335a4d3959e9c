pub mod deploy;
pub mod render;
pub mod stacks;
pub mod validate;
