//! Integrity hook for downloaded update archives.
//!
//! The engine calls [`Verifier::verify`] on every archive before extracting
//! it. [`AcceptAll`] is the default and performs no check; it is the
//! extension point for a signing or checksum scheme.
//!
//! # Example
//!
//! ```no_run
//! use uplift_verify::{Sha256Verifier, Verifier};
//!
//! let verifier = Sha256Verifier::from_hex(
//!     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
//! )
//! .unwrap();
//! let ok = verifier.verify("update.zip".as_ref()).unwrap();
//! ```

pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::verifier::{AcceptAll, Sha256Verifier, Verifier};

mod error;
mod hasher;
mod verifier;
