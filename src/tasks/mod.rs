pub mod results_reveal;

pub use results_reveal::ResultsReveal;
