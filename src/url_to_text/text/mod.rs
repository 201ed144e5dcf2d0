mod extractor;

pub use extractor::{ReadableRecipe, TextExtractor};
