use std::io::{self, BufRead};

use clap::Parser;
use color_eyre::eyre::WrapErr;
use scope_tree::{Scope, ScopeParser};

/// Reads scope expressions and prints them in canonical form
#[derive(Debug, Parser)]
#[command(name = "normalize")]
struct Opts {
    /// Scope expressions to normalize; read line by line from stdin when absent
    expressions: Vec<String>,

    /// The deepest permitted nesting of dependency groups
    #[arg(long, env = "SCOPE_MAX_DEPTH", default_value_t = ScopeParser::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Merge scopes that share a name before printing
    #[arg(long, env = "SCOPE_MERGE")]
    merge: bool,

    /// Require each expression to hold exactly one scope
    #[arg(long)]
    single: bool,
}

fn render(parser: &ScopeParser, opts: &Opts, text: &str) -> color_eyre::Result<String> {
    let scopes: Vec<Scope> = if opts.single {
        vec![parser.deserialize(text)?]
    } else {
        parser.parse(text)?
    };

    let scopes = if opts.merge {
        ScopeParser::merge_scopes(scopes)
    } else {
        scopes
    };

    tracing::debug!(scopes = scopes.len(), "rendering scopes");
    Ok(ScopeParser::serialize(&scopes, false)?)
}

fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let parser = ScopeParser::new().with_max_depth(opts.max_depth);
    tracing::info!(max_depth = parser.max_depth(), merge = opts.merge, "normalizing scopes");

    if opts.expressions.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            let rendered = render(&parser, &opts, &line)
                .wrap_err_with(|| format!("invalid scope expression: {}", line))?;
            println!("{}", rendered);
        }
    } else {
        for text in &opts.expressions {
            let rendered = render(&parser, &opts, text)
                .wrap_err_with(|| format!("invalid scope expression: {}", text))?;
            println!("{}", rendered);
        }
    }

    Ok(())
}
