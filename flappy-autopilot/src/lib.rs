pub mod benchmark;
pub mod controllers;
pub mod evolve;
pub mod network;
pub mod runner;
pub mod util;
