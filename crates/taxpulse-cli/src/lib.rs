//! # taxpulse-cli — Command Handlers
//!
//! Argument types and handlers for the `taxpulse` binary. The binary is
//! a thin front end over `taxpulse-run`: it loads a pack, reads a
//! transaction extract, computes one return, and prints the result. The
//! lifecycle workflow lives in the calling system; the CLI is for pack
//! authors and preparers checking figures.

pub mod check_pack;
pub mod compute;
