//! Mel filterbank, approximate mel→linear inverse and sparse encoding.
//!
//! Pipeline: [`filterbank::MelFilterbank`] → [`inverse::mel_to_linear`] →
//! [`sparse::SparseMatrix`].

pub mod filterbank;
pub mod inverse;
pub mod sparse;
