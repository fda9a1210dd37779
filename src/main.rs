mod adapters;
mod application;
mod args;
mod client;
mod config;
mod domain;
mod entry;
mod error;
mod shutdown;
mod system;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
