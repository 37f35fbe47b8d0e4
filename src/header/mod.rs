//! ELF header structures: the file header, program headers and section
//! headers

pub mod elf;
pub mod program;
pub mod section;
