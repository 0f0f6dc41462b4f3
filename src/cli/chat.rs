//! Resolve command handlers (single message + interactive).

use std::io::{self, BufRead, Write};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use mathchat::engine::{Decision, DecisionKind};
use mathchat::solver::{self, Solution};

use super::{build_engine, load_config, EngineArgs};

/// JSON shape printed by `resolve --json`.
#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    decision: &'a Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    solution: Option<&'a Solution>,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn solve_decision(message: &str, decision: &Decision) -> Option<Solution> {
    match decision.kind {
        DecisionKind::Math => decision
            .category
            .as_deref()
            .and_then(|category| solver::solve(message, category)),
        _ => None,
    }
}

/// Human-readable reply for a decision.
fn render(decision: &Decision, solution: Option<&Solution>) -> String {
    match decision.kind {
        DecisionKind::Chat | DecisionKind::Fallback => decision.text.clone(),
        DecisionKind::Math => match solution {
            Some(solution) => {
                let mut out = String::new();
                for (i, step) in solution.steps.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, step));
                }
                out.push_str(&format!("Answer: {}", solution.display_answer()));
                out
            }
            None => format!(
                "Looks like a math problem ({}): {}",
                decision.category.as_deref().unwrap_or("unknown"),
                decision.text
            ),
        },
    }
}

/// Resolve one message and print the outcome.
pub(crate) fn cmd_resolve(
    args: &EngineArgs,
    message: &str,
    json: bool,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(args)?;
    let engine = build_engine(&config)?;
    let mut rng = seeded_rng(seed);

    let decision = engine.respond(message, &mut rng);
    let solution = solve_decision(message, &decision);

    if json {
        let output = ResolveOutput {
            decision: &decision,
            solution: solution.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render(&decision, solution.as_ref()));
    }
    Ok(())
}

/// Interactive chat mode.
pub(crate) fn cmd_chat(args: &EngineArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(args)?;
    let engine = build_engine(&config)?;
    let mut rng = seeded_rng(seed);

    println!("MathChat");
    println!("Say hello or ask a math question. Type 'quit' or 'exit' to stop.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "quit" || input == "exit" {
                    println!("Goodbye!");
                    break;
                }

                let decision = engine.respond(input, &mut rng);
                let solution = solve_decision(input, &decision);
                println!();
                println!("{}", render(&decision, solution.as_ref()));
                println!();
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    Ok(())
}
