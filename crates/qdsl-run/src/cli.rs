use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use itertools::Itertools;
use miette::{IntoDiagnostic, miette};
use qdsl_lang::predicate::{NodeQuery, eq, name_equals};
use qdsl_lang::{Flattened, Node, Number, Selection, Value, flatten_forest};
use regex_lite::Regex;

use crate::loader;

#[derive(Parser, Debug)]
#[command(name = "qdsl")]
#[command(version)]
#[command(after_help = "Examples:\n\n\
    To print every container image:\n\
    $ qdsl find image manifests/\n\n\
    To list the dotted paths leading to a key:\n\
    $ qdsl crumbs replicas manifests/\n\n\
    To count the most common values of a key:\n\
    $ qdsl values image --top 5 manifests/")]
#[command(
    about = "qdsl queries trees of YAML and JSON configuration files.",
    long_about = None
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Commands,

    /// Skip files whose path matches this regular expression
    #[arg(long, global = true, default_value = ".*(log|txt)$")]
    ignore: String,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t)]
    format: Format,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, clap::Args)]
struct InputArgs {
    /// Files or directories to load
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every node with the given name
    Find {
        name: String,
        /// Only keep nodes holding one of these values
        #[arg(long = "value", value_name = "VALUE")]
        values: Vec<String>,
        /// Only keep nodes that have a child with this name
        #[arg(long, value_name = "NAME")]
        where_child: Option<String>,
        #[clap(flatten)]
        input: InputArgs,
    },
    /// List the distinct child names of the matching nodes, or of the document roots
    Keys {
        #[arg(long)]
        name: Option<String>,
        #[clap(flatten)]
        input: InputArgs,
    },
    /// List the distinct dotted paths to nodes with the given name
    Crumbs {
        name: String,
        #[clap(flatten)]
        input: InputArgs,
    },
    /// List the values of nodes with the given name
    Values {
        name: String,
        /// Print each distinct value once
        #[arg(short, long)]
        unique: bool,
        /// Print the N most common values with their counts
        #[arg(long, value_name = "N", conflicts_with = "unique")]
        top: Option<usize>,
        #[clap(flatten)]
        input: InputArgs,
    },
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        let ignore = if self.ignore.is_empty() {
            None
        } else {
            Some(
                Regex::new(&self.ignore)
                    .map_err(|e| miette!("Invalid --ignore pattern `{}`: {}", self.ignore, e))?,
            )
        };

        let files = loader::collect_files(&self.input().paths, ignore.as_ref());
        let trees = loader::load_files(&files);
        let index = flatten_forest(&trees);
        let roots = Selection::roots_of(&index);

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        match &self.commands {
            Commands::Find {
                name,
                values,
                where_child,
                ..
            } => {
                let mut query = NodeQuery::named(name.as_str());
                for value in values {
                    query = query.value(eq(parse_value(value)));
                }
                let mut found = roots.find(&query.build()?)?;
                if let Some(child) = where_child {
                    found = found.where_children(&name_equals(child))?;
                }
                self.print_nodes(&mut out, &index, &found)?;
            }
            Commands::Keys { name, .. } => {
                let selection = match name {
                    Some(name) => roots.find(&name_equals(name))?,
                    None => roots,
                };
                self.print_lines(&mut out, selection.keys())?;
            }
            Commands::Crumbs { name, .. } => {
                let crumbs = roots.find(&name_equals(name))?.crumbs();
                self.print_lines(&mut out, crumbs)?;
            }
            Commands::Values {
                name, unique, top, ..
            } => {
                let selection = roots.find(&name_equals(name))?;
                match top {
                    Some(n) => self.print_counts(&mut out, selection.most_common(Some(*n)))?,
                    None if *unique => self.print_values(&mut out, selection.unique_values())?,
                    None => self.print_values(&mut out, selection.values())?,
                }
            }
        }

        out.flush().into_diagnostic()
    }

    fn input(&self) -> &InputArgs {
        match &self.commands {
            Commands::Find { input, .. }
            | Commands::Keys { input, .. }
            | Commands::Crumbs { input, .. }
            | Commands::Values { input, .. } => input,
        }
    }

    fn print_nodes(&self, out: &mut impl Write, index: &Flattened<'_>, found: &Selection<'_, '_>) -> miette::Result<()> {
        match self.format {
            Format::Text => {
                for (&id, node) in found.ids().iter().zip(found.iter()) {
                    let source = index.source(id).unwrap_or("-");
                    let path = index.path(id).iter().map(|n| n.as_str()).join(".");
                    writeln!(out, "{} {}", source.cyan(), path.bold()).into_diagnostic()?;
                    write!(out, "{}", render(node)).into_diagnostic()?;
                }
            }
            Format::Json => {
                let items = found
                    .ids()
                    .iter()
                    .zip(found.iter())
                    .map(|(&id, node)| {
                        serde_json::json!({
                            "source": index.source(id),
                            "path": index.path(id).iter().map(|n| n.as_str()).join("."),
                            "node": node_to_json(node),
                        })
                    })
                    .collect::<Vec<_>>();
                write_json(out, &serde_json::Value::Array(items))?;
            }
        }
        Ok(())
    }

    fn print_lines(&self, out: &mut impl Write, lines: Vec<String>) -> miette::Result<()> {
        match self.format {
            Format::Text => {
                for line in lines {
                    writeln!(out, "{}", line).into_diagnostic()?;
                }
                Ok(())
            }
            Format::Json => write_json(out, &serde_json::json!(lines)),
        }
    }

    fn print_values(&self, out: &mut impl Write, values: Vec<&Value>) -> miette::Result<()> {
        match self.format {
            Format::Text => {
                for value in values {
                    writeln!(out, "{}", value).into_diagnostic()?;
                }
                Ok(())
            }
            Format::Json => write_json(
                out,
                &serde_json::Value::Array(values.into_iter().map(value_to_json).collect()),
            ),
        }
    }

    fn print_counts(&self, out: &mut impl Write, counts: Vec<(&Value, usize)>) -> miette::Result<()> {
        match self.format {
            Format::Text => {
                for (value, count) in counts {
                    writeln!(out, "{}\t{}", count, value).into_diagnostic()?;
                }
                Ok(())
            }
            Format::Json => {
                let items = counts
                    .into_iter()
                    .map(|(value, count)| serde_json::json!({"value": value_to_json(value), "count": count}))
                    .collect();
                write_json(out, &serde_json::Value::Array(items))
            }
        }
    }
}

/// The node's tree display without its surrounding blank lines.
fn render(node: &Node) -> String {
    let text = node.to_string();
    format!("{}\n", text.trim_matches('\n'))
}

fn write_json(out: &mut impl Write, value: &serde_json::Value) -> miette::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()
}

/// Reads a command-line value the way YAML would type it.
fn parse_value(text: &str) -> Value {
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "~" => Value::None,
        _ => {
            if let Ok(i) = text.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = text.parse::<f64>() {
                Value::Number(Number::new(f))
            } else {
                Value::from(text)
            }
        }
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) if n.is_int() => serde_json::json!(n.value() as i64),
        Value::Number(n) => serde_json::Number::from_f64(n.value())
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
    }
}

fn node_to_json(node: &Node) -> serde_json::Value {
    if node.is_leaf() {
        return match node.value() {
            [single] => value_to_json(single),
            values => serde_json::Value::Array(values.iter().map(value_to_json).collect()),
        };
    }

    let counts = node.children().iter().map(Node::name).counts();
    let mut map = serde_json::Map::new();
    for child in node.children() {
        let key = child.name().map(|n| n.as_str()).unwrap_or_default();
        let value = node_to_json(child);
        if counts.get(&child.name()).is_some_and(|&count| count > 1) {
            if let serde_json::Value::Array(items) = map
                .entry(key)
                .or_insert_with(|| serde_json::Value::Array(Vec::new()))
            {
                items.push(value);
            }
        } else {
            map.insert(key, value);
        }
    }
    serde_json::Value::Object(map)
}
