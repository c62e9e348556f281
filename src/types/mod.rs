mod doc;

pub use doc::*;
