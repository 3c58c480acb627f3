mod chain;
mod cli;
mod covalent;
mod env;
mod log;
mod output;
mod scan;
mod sheets;

pub use scan::run;
