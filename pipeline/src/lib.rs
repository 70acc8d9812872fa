#![allow(dead_code)]
#![allow(unused_imports)]

pub mod data;
pub mod fifi_ls;
pub mod header;
pub mod parameter;
pub mod parameters;
pub mod registry;
