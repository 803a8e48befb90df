use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use task_router::Coordinator;
use task_router::backend::{HttpBackend, InMemoryBackend, TaskBackend};
use task_router::config::{BackendConfig, RouterConfig};
use task_router::extract::{ExtractedContent, PersistReport};

const HELP: &str = "\
Commands:
  analyze          list automatable tasks and their handlers
  run              hand every automatable task to its handler
  process          extract tasks from text typed until a line with ---
  email <path>     extract tasks from a raw email file
  execute <id>     route and hand off one task
  workload [user]  task counts by status and priority
  help             show this message
  quit             wait for running handoffs and exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let router_config = RouterConfig::from_env()?;

    eprintln!("Task router v{}", env!("CARGO_PKG_VERSION"));
    let backend: Arc<dyn TaskBackend> = match BackendConfig::from_env() {
        Ok(config) => {
            eprintln!("   Backend: {}", config.base_url);
            Arc::new(HttpBackend::new(config))
        }
        Err(e) => {
            warn!(error = %e, "No remote backend configured, using in-memory store");
            eprintln!("   Backend: in-memory");
            Arc::new(InMemoryBackend::new())
        }
    };

    eprintln!("   Organization: {}", router_config.organization_id);
    eprintln!("   Type 'help' for commands.\n");

    let coordinator = Coordinator::new(backend, router_config).with_status_tracking_handlers();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut outstanding = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => continue,
            "analyze" => match coordinator.analyze().await {
                Ok(report) => {
                    for order in &report.orders {
                        println!("{:<10} {}  {}", order.handler, order.task_id(), order.task.title);
                    }
                    for task in &report.needs_attention {
                        println!("{:<10} {}  {}", "(human)", task.id, task.title);
                    }
                    println!(
                        "{} automatable, {} need attention",
                        report.orders.len(),
                        report.needs_attention.len()
                    );
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            "run" => match coordinator.run_automation().await {
                Ok(run) => {
                    println!(
                        "Handed off {} task(s); {} need attention; {} undelivered",
                        run.handoffs.len(),
                        run.needs_attention.len(),
                        run.undelivered.len()
                    );
                    outstanding.extend(run.handoffs);
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            "process" => {
                let mut text = String::new();
                while let Some(next) = lines.next_line().await? {
                    if next.trim() == "---" {
                        break;
                    }
                    text.push_str(&next);
                    text.push('\n');
                }
                let (content, report) = coordinator.process_content(&text, None).await;
                print_extraction(&content, &report);
            }
            "email" if !arg.is_empty() => match tokio::fs::read(arg).await {
                Ok(raw) => match coordinator.process_email(&raw).await {
                    Some((content, report)) => print_extraction(&content, &report),
                    None => eprintln!("Error: {arg} is not a readable email"),
                },
                Err(e) => eprintln!("Error: cannot read {arg}: {e}"),
            },
            "execute" if !arg.is_empty() => match coordinator.execute_task(arg).await {
                Ok(handle) => {
                    println!("Handed off {arg}");
                    outstanding.push(handle);
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            "workload" => match coordinator.workload((!arg.is_empty()).then_some(arg)).await {
                Ok(metrics) => {
                    println!("Total: {}", metrics.total_tasks);
                    for (status, count) in &metrics.by_status {
                        println!("  {status:<12} {count}");
                    }
                    for (priority, count) in &metrics.by_priority {
                        println!("  {priority:<12} {count}");
                    }
                    println!("Overdue: {}", metrics.overdue);
                    println!("Due this week: {}", metrics.due_this_week);
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            "help" => println!("{HELP}"),
            "quit" | "exit" => break,
            other => eprintln!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }

    if !outstanding.is_empty() {
        eprintln!("Waiting for {} handoff(s)...", outstanding.len());
        futures::future::join_all(outstanding).await;
    }
    Ok(())
}

fn print_extraction(content: &ExtractedContent, report: &PersistReport) {
    println!("{}", content.summary);
    for project in &content.projects {
        println!("Project: {}", project.name);
        for task in &project.tasks {
            println!("  - [{}] {}", task.priority, task.title);
        }
    }
    for task in &content.standalone_tasks {
        let due = task.due_date.map(|d| format!(" (due {d})")).unwrap_or_default();
        println!("- [{}] {}{due}", task.priority, task.title);
    }
    for failure in &report.errors {
        eprintln!("Not saved: {}: {}", failure.item, failure.error);
    }
}
