//! # idml-gen
//!
//! Builds an IDML document from an extracted template package and a directory
//! of photos. The template carries one two-page "content spread" with photo
//! placeholders. That spread is cloned once per pair of photos, every
//! placeholder token in the package is substituted, and the result is zipped
//! back into an `.idml` file.
//!
//! # Pipeline
//!
//! ```text
//! template/ ──copy──▶ tmp/ ──spreads──▶ tmp/Spreads/Spread_A{0,2,..}.xml
//!                                │
//!    variables.txt ──▶ VariableTable (+ [SPREADS]) ──substitute──▶ tmp/**.xml
//!                                                                    │
//!                                                  out.idml ◀──zip───┘
//! ```
//!
//! Each stage is a plain function over paths and values; the driver in
//! [`pipeline`] wires them together and owns the variable table.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Path resolution from the template file name; TOML settings |
//! | [`workdir`] | Recursive directory copy and force-delete |
//! | [`variables`] | Ordered placeholder table and the `key=value` file format |
//! | [`spreads`] | Photo pairing and content spread generation |
//! | [`substitute`] | Single-pass placeholder substitution over `.xml` files |
//! | [`archive`] | Zip packaging and extraction of IDML packages |
//! | [`pipeline`] | Stage driver and run report |
//! | [`output`] | CLI summary formatting |
//!
//! # Placeholders
//!
//! Tokens are literal bracketed strings such as `[TITLE]`. The five spread
//! tokens (`[PHOTO1]`, `[PHOTO2]`, `[PAGE1_ID]`, `[PAGE2_ID]`, `[SPREAD_ID]`)
//! are filled per spread; `[SPREADS]` is synthesized from the generated files
//! and normally appears once in `designmap.xml`. Every other token comes from
//! the variables file. Substitution is textual and does not parse XML.

pub mod archive;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod spreads;
pub mod substitute;
pub mod variables;
pub mod workdir;

#[cfg(test)]
pub(crate) mod test_helpers;
