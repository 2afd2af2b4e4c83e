// src/services/mod.rs
pub mod completion;
