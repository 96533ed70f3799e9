//! Placeholder Grammar, Scanning, and Substitution
//!
//! A placeholder is a delimited token in document text that marks a
//! substitution point, e.g. `{name}` or `{{name}}`. This crate keeps one
//! grammar definition that drives both the scanner and the substitutor so
//! that what is listed is exactly what gets replaced.
//!
//! # Names
//!
//! Names are permissive: whatever appears between the delimiters, trimmed
//! of surrounding whitespace, is the name. `{ nama }` and `{nama}` both
//! name `nama`. Empty names (`{}` or `{  }`) are never reported.
//!
//! # Example
//!
//! ```rust
//! use placeholder::{Grammar, SubstitutionMap};
//!
//! let grammar = Grammar::SingleBrace;
//! assert_eq!(grammar.scan("Dear {name}, {name}!"), vec!["name".to_string()]);
//!
//! let mut values = SubstitutionMap::new();
//! values.insert("name".to_string(), "Dedi".to_string());
//! assert_eq!(grammar.substitute("Dear {name} from {city}", &values), "Dear Dedi from {city}");
//! ```

mod error;
mod grammar;
mod scanner;
mod substitute;

pub use error::{PlaceholderError, Result};
pub use grammar::{Grammar, Span};
pub use scanner::scan;
pub use substitute::{substitute, SubstitutionMap};
