// Results table: fixture candidates per workspace, shortlist toggling, export.

pub mod board;
pub mod fixtures;
pub mod handlers;
pub mod models;
