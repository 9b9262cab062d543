// Synthesis: text lines → stroke sequences, one recurrent run per line.
//
// alphabet   model vocabulary and character encoding
// sampler    biased mixture sampling for one step
// primer     style primers and the library that holds them
// generator  per-line run loop (prime, sample, stop)
// pool       bounded parallel execution of line jobs
// pipeline   full document composition on top of layout

pub mod alphabet;
pub mod generator;
pub mod handlers;
pub mod pipeline;
pub mod pool;
pub mod primer;
pub mod sampler;

pub use generator::GeneratorConfig;
pub use pipeline::Synthesis;
pub use pool::GenerationPool;
pub use primer::StyleLibrary;
