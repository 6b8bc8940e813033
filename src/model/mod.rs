// Documentation object model

pub mod node;
pub mod value;

pub use node::{BlockTag, Category, Comment, DocNode, Kind, Visibility};
pub use value::{DocValue, Scalar};
