//! Orchestration melsparse : configuration, calcul, écriture de la table.

pub mod cli;
pub mod pipeline;
