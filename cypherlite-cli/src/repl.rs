use crate::execute;
use crate::output::OutputFormat;
use anyhow::Result;
use cypherlite_query::{ExecutionOptions, prepare};
use cypherlite_storage::MemGraph;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::time::Instant;

pub fn run_repl(mut graph: MemGraph, options: ExecutionOptions, format: OutputFormat) -> Result<()> {
    println!("cypherlite REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type .help for instructions, .exit to quit.\n");

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("cypherlite> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with('.') {
                    match line {
                        ".exit" | ".quit" => {
                            println!("Bye!");
                            break;
                        }
                        ".help" => {
                            println!("Commands:");
                            println!("  .exit, .quit  Exit the REPL");
                            println!("  .help         Show this help message");
                            println!("  .stats        Show node and edge counts");
                            println!("  <query>       Run a MATCH or CREATE query");
                            println!("  EXPLAIN <q>   Show the atomic facts of a query");
                        }
                        ".stats" => {
                            println!(
                                "{} nodes, {} edges",
                                graph.node_count(),
                                graph.edge_count()
                            );
                        }
                        _ => println!("Unknown command: {line}"),
                    }
                    continue;
                }

                let start = Instant::now();
                let query = match prepare(line) {
                    Ok(query) => query,
                    Err(e) => {
                        println!("Error preparing query: {e}");
                        continue;
                    }
                };
                let mut stdout = std::io::stdout().lock();
                match execute(&query, &mut graph, options, format, &mut stdout) {
                    Ok(count) => {
                        println!("({count} rows, {:.4}s)", start.elapsed().as_secs_f64());
                    }
                    Err(e) => println!("Error: {e:#}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
