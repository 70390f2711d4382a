use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cmd_translate;
mod cmd_uri;

#[derive(Parser)]
#[command(name = "rqc", about = "Typed predicate to REST query translator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a lambda into a filter expression
    Translate {
        /// Schema files (.rqs) declaring the resource types
        #[arg(long, required = true)]
        schema: Vec<PathBuf>,

        /// Resource type the lambda parameter is bound to
        #[arg(long)]
        resource: String,

        /// Member naming: "camel_case" or "declared"
        #[arg(long, default_value = "camel_case")]
        naming: String,

        /// Treat the lambda as a selector (no boolean body required)
        #[arg(long)]
        selector: bool,

        /// Lambda text, e.g. 'x => x.Age > 18'
        lambda: String,
    },
    /// Compose the full request URI for a resource query
    Uri {
        /// Path to rq.toml config file
        #[arg(short, long)]
        config: PathBuf,

        /// Resource type to query
        #[arg(long)]
        resource: String,

        /// Predicate lambdas, joined with `and`
        #[arg(long)]
        filter: Vec<String>,

        /// Ordering selector lambdas, applied in order
        #[arg(long)]
        order_by: Vec<String>,

        /// Sort every --order-by key descending
        #[arg(long)]
        desc: bool,

        /// Projection selector lambdas
        #[arg(long)]
        select: Vec<String>,

        /// Expansion selector lambdas
        #[arg(long)]
        expand: Vec<String>,

        /// Page size (overrides service.default_top)
        #[arg(long)]
        top: Option<u32>,

        /// Number of entries to skip
        #[arg(long)]
        skip: Option<u32>,

        /// Print the URI and its options as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            schema,
            resource,
            naming,
            selector,
            lambda,
        } => cmd_translate::run(schema, resource, naming, selector, lambda),
        Commands::Uri {
            config,
            resource,
            filter,
            order_by,
            desc,
            select,
            expand,
            top,
            skip,
            json,
        } => cmd_uri::run(cmd_uri::UriArgs {
            config,
            resource,
            filter,
            order_by,
            desc,
            select,
            expand,
            top,
            skip,
            json,
        }),
    }
}
