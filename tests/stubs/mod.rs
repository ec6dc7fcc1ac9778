#![allow(dead_code)]

pub mod dumps;
pub mod drivers;
