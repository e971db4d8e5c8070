// textmining: corpus analytics for student reflection documents
//
// This is the library root. The corpus is loaded once and every analysis
// module reads from it; the CLI in main.rs wires them together.

pub mod config;
pub mod corpus;
pub mod db;
pub mod frequency;
pub mod output;
pub mod sentiment;
pub mod similarity;
pub mod status;
pub mod summary;
pub mod text;
pub mod topics;
