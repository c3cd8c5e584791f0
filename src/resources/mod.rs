pub mod defaults;
pub mod deployment;
pub mod labels;
pub mod memory;
pub mod naming;
