
pub mod branch;
pub mod hint;
pub mod formula;
pub mod buffer;
pub mod history;
pub mod predictor;
pub mod stats;

pub use branch::*;
pub use hint::*;
pub use formula::*;
pub use buffer::*;
pub use history::*;
pub use predictor::*;
