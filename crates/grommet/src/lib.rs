//! Grommet - an issue tracker with file attachments.
//!
//! This crate provides both a terminal application and a library. Issues
//! live in an in-memory store; attachments are uploaded through a simulated
//! presigned-URL object store that reports progress while it "transfers".

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod files;
pub mod id_generation;
pub mod object_store;
pub mod storage;
pub mod upload;

// Terminal front end (needed by binary)
pub mod cli;
pub mod output;
