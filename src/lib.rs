//! Feedpage - A static feed digest
//!
//! This crate fetches a fixed list of RSS/Atom feeds concurrently, merges
//! their recent entries newest first, and renders them into a single static
//! HTML page.

pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod post;
pub mod runner;
pub mod site;
