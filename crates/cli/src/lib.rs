pub mod config;
pub mod pipeline;
pub mod poster;
#[cfg(test)]
mod testing;
