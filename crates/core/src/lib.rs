//! Core library for weave
//!
//! This crate implements the **Functional Core** of the weave application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! weave uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`weave_core`** (this crate): prompt assembly, the completion contract,
//!   response extraction and file application
//! - **`weave`**: the CLI, HTTP transport, git lookups, template evaluation
//!   and process execution (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! - **No network or process I/O**: the completion call, git and post-write
//!   commands live in the shell
//! - **Filesystem only where the operation is about files**: include
//!   expansion reads the files it inlines, and applying writes the files it
//!   was given
//! - **Failures as values**: every fallible function returns a typed error
//!   or a [`generate::CompletionResult`]
//!
//! # Module Organization
//!
//! - [`generate`]: everything a single `weave generate` run needs
//!   - [`generate::include`]: recursive `include:<path>` expansion
//!   - [`generate::prompt`]: front matter and line numbering
//!   - [`generate::completion`]: request defaults, wire types, result
//!     classification
//!   - [`generate::extract`]: marker + fence parsing of a response
//!   - [`generate::apply`]: writing extracted files without overwriting
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use weave_core::generate::{apply, extract_files};
//!
//! let files = extract_files("FILE: hello.txt\n```\nhi\n```")?;
//! let results = apply(std::path::Path::new("out"), &files)?;
//!
//! assert!(results[0].generated);
//! ```

pub mod generate;
