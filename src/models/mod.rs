// src/models/mod.rs

pub mod account;
pub mod author;
pub mod question;
pub mod result;
pub mod stats;
