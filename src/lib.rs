#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod commands;
pub mod config;
pub mod console;
pub mod firmware;
pub mod uart;
pub mod usb;
