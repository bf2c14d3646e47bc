pub mod client;
pub mod error;
pub mod generator;
pub mod owner;
pub mod response;
pub mod scope;
pub mod settings;
pub mod token;

pub use client::*;
pub use error::*;
pub use generator::*;
pub use owner::*;
pub use response::*;
pub use scope::*;
pub use settings::*;
pub use token::*;
