//! Completion provider backends.

pub mod groq;
