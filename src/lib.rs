mod symbols;
pub mod loc;
mod lexer;
mod devices;
mod network;
mod monitors;
mod error;
mod parse;
mod circuit;


pub use symbols::*;
pub use loc::*;
pub use lexer::*;
pub use devices::*;
pub use network::*;
pub use monitors::*;
pub use error::*;
pub use parse::*;
pub use circuit::*;
