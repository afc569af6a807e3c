//! Contains the transcendental functions, the machinery that rounds them
//! correctly, and the constants they share.

pub mod constants;
mod exp;
mod functions;
mod ziv;
