mod adapter;
mod app;
mod backend;
mod config;
mod engine;
mod error;
mod library;
mod logging;
mod mpris;
mod player;
mod runtime;
#[cfg(test)]
mod testing;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
