#![allow(dead_code)]

pub mod decoders;
pub mod flowerwave_env;
