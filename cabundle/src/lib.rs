//! # cabundle
//!
//! Core conversion traits shared by the CA bundle toolkit.
//!
//! ## Overview
//!
//! A certificate travels through the toolkit like this:
//! ```text
//! certdata octal lines → Vec<u8> (DER) → Pem → bundle text
//! ```
//!
//! The `Decoder` trait covers the first step (text to bytes) and the
//! `Encoder` trait the second one (bytes to PEM).
//!
//! ## Type Safety
//!
//! Each trait is constrained by a marker trait (`DecodableFrom` and
//! `EncodableTo`), so only conversions that were declared explicitly compile.
//!
//! ## Example
//!
//! ```ignore
//! use cabundle::decoder::Decoder;
//! use cabundle::encoder::Encoder;
//! use certdata::octal::OctalLine;
//! use pem::Pem;
//!
//! let group = regex::Regex::new(r"^[0-7]{3}$").unwrap();
//! let der: Vec<u8> = OctalLine::new(r"\060\003", &group).decode().unwrap();
//! let pem: Pem = der.encode().unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
