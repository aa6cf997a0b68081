//! Parser modules for PBS data files.
//!
//! PBS files are line oriented: `#` starts a comment, `[header]` lines open a
//! section, and each following line is a `Key = value` pair whose value is a
//! comma separated list of fields.
//!
//! # Usage
//!
//! ```ignore
//! use pbs::parser::read_file_sections;
//!
//! for section in read_file_sections(Path::new("PBS/types.txt"), &cancel)? {
//!     let section = section?;
//!     println!("Found: {}", section.name);
//! }
//! ```

mod line_data;
pub mod csv;
pub mod tokenizer;

pub use line_data::FileLineData;
pub use tokenizer::{
    open_file, prep_line, read_file_lines, read_file_sections, Lines, PbsLine, PbsPair,
    PbsSection, Sections,
};
