pub mod block_parser;

pub use block_parser::parse_blocks;
