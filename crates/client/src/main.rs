//! todoapi-client CLI entry point.

use clap::Parser;

use todoapi_client::bench;
use todoapi_client::cli::todos::TodosAction;
use todoapi_client::cli::{Cli, Commands, OutputFormat};
use todoapi_client::client::TodoClient;
use todoapi_client::output::{format_json, pretty};
use todoapi_core::todo::{CreateTodoRequest, TodoFilter, UpdateTodoRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = TodoClient::new(&cli.base_url);

    match cli.command {
        Commands::Todos(todos_cmd) => match todos_cmd.action {
            TodosAction::List {
                completed,
                priority,
            } => {
                let todos = client
                    .list_todos_timed(&TodoFilter {
                        completed,
                        priority,
                    })
                    .await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&todos.value)),
                    OutputFormat::Pretty => {
                        println!("{}", pretty::format_todos(&todos.value));
                        if !cli.quiet {
                            println!("\n{}", pretty::format_timing(&todos));
                        }
                    }
                }
            }
            TodosAction::Create {
                title,
                description,
                priority,
                due_date,
                payload,
            } => {
                let request = CreateTodoRequest {
                    title,
                    description,
                    priority,
                    due_date,
                    payload,
                };
                let todo = client.create_todo_timed(&request).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&todo.value)),
                    OutputFormat::Pretty => {
                        println!("Created:\n{}", pretty::format_todo(&todo.value));
                        if !cli.quiet {
                            println!("\n{}", pretty::format_timing(&todo));
                        }
                    }
                }
            }
            TodosAction::Get { id } => {
                let todo = client.get_todo_timed(id).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&todo.value)),
                    OutputFormat::Pretty => {
                        println!("{}", pretty::format_todo(&todo.value));
                        if !cli.quiet {
                            println!("\n{}", pretty::format_timing(&todo));
                        }
                    }
                }
            }
            TodosAction::Update {
                id,
                title,
                description,
                completed,
                priority,
                due_date,
                payload,
            } => {
                let request = UpdateTodoRequest {
                    title,
                    description,
                    completed,
                    priority,
                    due_date,
                    payload,
                };
                let todo = client.update_todo_timed(id, &request).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_json(&todo.value)),
                    OutputFormat::Pretty => {
                        println!("Updated:\n{}", pretty::format_todo(&todo.value));
                        if !cli.quiet {
                            println!("\n{}", pretty::format_timing(&todo));
                        }
                    }
                }
            }
            TodosAction::Delete { id } => {
                let deleted = client.delete_todo_timed(id).await?;
                if !cli.quiet {
                    println!("Deleted TODO {}", id);
                    if matches!(cli.format, OutputFormat::Pretty) {
                        println!("\n{}", pretty::format_timing(&deleted));
                    }
                }
            }
        },
        Commands::SelectOne => {
            let response = client.select_one_timed().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&response)),
                OutputFormat::Pretty => {
                    println!(
                        "{}",
                        pretty::format_select_one(response.value.result, &response.value.timing)
                    );
                    if !cli.quiet {
                        println!("\n{}", pretty::format_timing(&response));
                    }
                }
            }
        }
        Commands::Health => {
            let health = client.healthcheck().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&health)),
                OutputFormat::Pretty => println!("{}", pretty::format_health(&health)),
            }
            if !health.is_healthy() {
                std::process::exit(1);
            }
        }
        Commands::Bench(args) => {
            let config = args.config();
            if !cli.quiet && matches!(cli.format, OutputFormat::Pretty) {
                println!(
                    "Running {} CRUD cycles on {} worker(s) against {}...",
                    config.iterations,
                    config.concurrency,
                    client.base_url()
                );
            }
            let report = bench::run(&client, config).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&report)),
                OutputFormat::Pretty => println!("{}", pretty::format_bench(&report)),
            }
        }
    }

    Ok(())
}
