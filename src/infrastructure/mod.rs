pub mod in_memory;
pub mod orphan_file;
