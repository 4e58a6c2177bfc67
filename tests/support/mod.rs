#![allow(dead_code)]

pub mod bridge_harness;
