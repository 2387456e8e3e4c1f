#![doc = include_str!("../README.md")]

mod error;

pub mod crc;
pub mod mo;
pub mod parameter;
pub mod receiver;
pub mod spacepacket;
pub mod store;
pub mod xml;

pub use error::{Error, Result};
