//! Export de la table de coefficients mel→linear.

pub mod emit;
