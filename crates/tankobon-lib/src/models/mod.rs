pub mod source_info;
pub use source_info::*;

pub mod title;
pub use title::*;

pub mod chapter_key;
pub use chapter_key::*;

pub mod chapter;
pub use chapter::*;
