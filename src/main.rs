use colored::Colorize;
use std::process;

fn main() {
    if let Err(e) = brisk::cli::run() {
        if let Some(clap_error) = e.downcast_ref::<clap::Error>() {
            clap_error.exit();
        }
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
