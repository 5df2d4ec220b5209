//! Rig assembly and the conversation driver.

pub mod rig;

pub use rig::{AudioDevices, Collaborators, Hardware, Rig};
