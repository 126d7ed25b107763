//! CLI module - Command-line interface for Foodgram
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "daemon", alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Register an account and print its API token
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        password: String,
    },

    /// Load ingredients from a .json or .csv file
    #[command(alias = "import-csv")]
    ImportIngredients {
        /// Path to the ingredient file
        path: PathBuf,
    },

    /// Load tags from a .json file
    ImportTags {
        /// Path to the tag file
        path: PathBuf,
    },
}

pub use commands::*;
