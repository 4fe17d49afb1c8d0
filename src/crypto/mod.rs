// src/crypto/mod.rs
// Envelope Crypto (C7) — spec §4.7.
//
// Protects a user's provider credentials at rest without holding a
// user-supplied key. A process-wide root key (KEK) wraps a fresh per-write
// data key (DEK); the DEK in turn seals the credential list. AES-256-GCM via
// `openssl::symm`, the crypto crate already present in the pack (the
// teacher's mira-server optional `vendored-openssl` feature, and a hard
// dependency of mozilla-services-autopush-rs's autopush-common).

pub mod envelope;

pub use envelope::{open_credentials, seal_credentials, EnvelopeError};
