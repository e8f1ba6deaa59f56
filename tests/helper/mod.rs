#![allow(dead_code)]

mod distro;
mod upstream;

pub use distro::*;
pub use upstream::*;
