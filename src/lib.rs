//! subctl - diagnostics for Submariner multi-cluster connectivity

pub mod cli;
pub mod client;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod crd;
pub mod diagnose;
pub mod error;
pub mod executor;
pub mod pods;
pub mod poll;
pub mod reporter;
